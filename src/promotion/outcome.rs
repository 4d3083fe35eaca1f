//! Per-index promotion outcomes.

use crate::client::IndexName;

use super::errors::PromotionError;
use super::state::PromotionStep;

/// Outcome of promoting one index.
#[derive(Debug, Clone)]
pub enum PromotionOutcome {
    /// Index is an independent, writable index.
    Succeeded {
        /// Attempts taken, including the successful one.
        attempts: u32,
    },

    /// Retry budget exhausted, or a non-retryable failure.
    Failed {
        last_error: PromotionError,
        attempts_used: u32,
        /// Furthest state any attempt reached.
        furthest: PromotionStep,
    },

    /// Dry run: nothing was sent.
    SkippedDryRun,
}

impl PromotionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// The index was left closed or unfollowed and must be finished by hand.
    pub fn requires_manual_completion(&self) -> bool {
        match self {
            Self::Failed { furthest, .. } => furthest.is_interim(),
            _ => false,
        }
    }
}

/// Outcome for a named index.
#[derive(Debug, Clone)]
pub struct IndexPromotion {
    pub index: IndexName,
    pub outcome: PromotionOutcome,
}

impl IndexPromotion {
    pub fn new(index: IndexName, outcome: PromotionOutcome) -> Self {
        Self { index, outcome }
    }
}
