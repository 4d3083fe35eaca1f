//! Promotion State Machine states
//!
//! States are strictly ordered:
//!
//! ```text
//! Following → Paused → AliasesCaptured → Closed → Unfollowed
//!           → Reopened → AliasesRestored → WritesEnabled
//! ```
//!
//! - No skipping: each transition enters the immediate successor
//! - No going back: a failed attempt restarts from `Following`
//! - `WritesEnabled` is the only terminal state
//!
//! Interim semantics:
//! - Following..AliasesCaptured: replication paused at most; resumable
//! - Closed: index unavailable for reads; aborting leaves it closed
//! - Unfollowed..AliasesRestored: relationship severed; only forward
//!   completion (manual or retried) restores a usable index

use super::errors::{PromotionError, PromotionResult};

/// Promotion progress of a single index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PromotionStep {
    /// Replicating from its leader; no promotion step taken yet.
    Following,
    /// Replication paused.
    Paused,
    /// Alias bindings read into a snapshot.
    AliasesCaptured,
    /// Index closed.
    Closed,
    /// Follow relationship severed. Irreversible.
    Unfollowed,
    /// Index reopened as a plain index.
    Reopened,
    /// Every captured alias reapplied.
    AliasesRestored,
    /// Write block cleared. Terminal success.
    WritesEnabled,
}

impl Default for PromotionStep {
    fn default() -> Self {
        Self::Following
    }
}

impl PromotionStep {
    /// Every state, in sequence order.
    pub const SEQUENCE: [PromotionStep; 8] = [
        Self::Following,
        Self::Paused,
        Self::AliasesCaptured,
        Self::Closed,
        Self::Unfollowed,
        Self::Reopened,
        Self::AliasesRestored,
        Self::WritesEnabled,
    ];

    /// Get the state name for observability.
    pub fn state_name(&self) -> &'static str {
        match self {
            Self::Following => "Following",
            Self::Paused => "Paused",
            Self::AliasesCaptured => "AliasesCaptured",
            Self::Closed => "Closed",
            Self::Unfollowed => "Unfollowed",
            Self::Reopened => "Reopened",
            Self::AliasesRestored => "AliasesRestored",
            Self::WritesEnabled => "WritesEnabled",
        }
    }

    /// The remote action that enters this state.
    pub fn action(&self) -> &'static str {
        match self {
            Self::Following => "follow",
            Self::Paused => "pause_follow",
            Self::AliasesCaptured => "get_aliases",
            Self::Closed => "close_index",
            Self::Unfollowed => "unfollow",
            Self::Reopened => "open_index",
            Self::AliasesRestored => "put_alias",
            Self::WritesEnabled => "clear_write_block",
        }
    }

    /// The immediate successor, if any.
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Following => Some(Self::Paused),
            Self::Paused => Some(Self::AliasesCaptured),
            Self::AliasesCaptured => Some(Self::Closed),
            Self::Closed => Some(Self::Unfollowed),
            Self::Unfollowed => Some(Self::Reopened),
            Self::Reopened => Some(Self::AliasesRestored),
            Self::AliasesRestored => Some(Self::WritesEnabled),
            Self::WritesEnabled => None,
        }
    }

    /// The immediate predecessor, if any.
    pub fn previous(&self) -> Option<Self> {
        Self::SEQUENCE
            .iter()
            .position(|s| s == self)
            .and_then(|i| i.checked_sub(1))
            .map(|i| Self::SEQUENCE[i])
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::WritesEnabled)
    }

    /// The index is closed or unfollowed but not yet writable again.
    pub fn is_interim(&self) -> bool {
        *self >= Self::Closed && *self < Self::WritesEnabled
    }

    /// The follow relationship has been severed.
    pub fn is_severed(&self) -> bool {
        *self >= Self::Unfollowed
    }

    /// Enter `to`, which must be the immediate successor of `self`.
    pub fn advance(self, to: PromotionStep) -> PromotionResult<Self> {
        match self.next() {
            Some(next) if next == to => Ok(to),
            _ => Err(PromotionError::forbidden_transition(
                self.state_name(),
                to.state_name(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_following() {
        assert_eq!(PromotionStep::default(), PromotionStep::Following);
    }

    #[test]
    fn test_full_sequence_advances() {
        let mut state = PromotionStep::Following;
        for to in PromotionStep::SEQUENCE.iter().skip(1) {
            state = state.advance(*to).unwrap();
        }
        assert!(state.is_terminal());
        assert_eq!(PromotionStep::Following.previous(), None);
        assert_eq!(state.next(), None);
    }

    #[test]
    fn test_skipping_is_forbidden() {
        let err = PromotionStep::Paused
            .advance(PromotionStep::Closed)
            .unwrap_err();
        assert!(err.to_string().contains("Paused"));
        assert!(err.to_string().contains("Closed"));
    }

    #[test]
    fn test_going_back_is_forbidden() {
        assert!(PromotionStep::Reopened
            .advance(PromotionStep::Closed)
            .is_err());
        assert!(PromotionStep::WritesEnabled
            .advance(PromotionStep::Following)
            .is_err());
    }

    #[test]
    fn test_sequence_is_ordered() {
        for pair in PromotionStep::SEQUENCE.windows(2) {
            assert!(pair[0] < pair[1]);
            assert_eq!(pair[0].next(), Some(pair[1]));
            assert_eq!(pair[1].previous(), Some(pair[0]));
        }
    }

    #[test]
    fn test_interim_window() {
        assert!(!PromotionStep::AliasesCaptured.is_interim());
        assert!(PromotionStep::Closed.is_interim());
        assert!(PromotionStep::AliasesRestored.is_interim());
        assert!(!PromotionStep::WritesEnabled.is_interim());
        assert!(!PromotionStep::Closed.is_severed());
        assert!(PromotionStep::Unfollowed.is_severed());
    }
}
