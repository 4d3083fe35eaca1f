//! Reconciliation errors.
//!
//! Only inventory failures abort a bootstrap run: without both inventories no
//! plan can be computed. Per-index follow failures are recorded in the report.

use thiserror::Error;

use crate::client::ClientError;

#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Leader open-index listing failed on every attempt.
    #[error("leader inventory unavailable after {attempts} attempt(s): {source}")]
    LeaderInventory {
        attempts: u32,
        #[source]
        source: ClientError,
    },

    /// Follower relationship listing failed.
    #[error("follower relationships unavailable: {source}")]
    FollowerInventory {
        #[source]
        source: ClientError,
    },
}

pub type ReconcileResult<T> = Result<T, ReconcileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_attempts() {
        let err = ReconcileError::LeaderInventory {
            attempts: 3,
            source: ClientError::connectivity("http://leader/_cat/indices", "refused"),
        };
        let text = err.to_string();
        assert!(text.contains("3 attempt(s)"));
        assert!(text.contains("refused"));
    }
}
