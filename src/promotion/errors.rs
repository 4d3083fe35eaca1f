//! Promotion Error Types
//!
//! A promotion attempt fails at exactly one step. The error names that step
//! and carries the remote error that caused it, so an operator can finish or
//! re-run the sequence by hand.

use std::fmt;

use crate::client::{ClientError, ClientErrorKind};

use super::state::PromotionStep;

/// Promotion error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromotionErrorKind {
    /// Forbidden state transition attempted
    ForbiddenTransition,

    /// A remote call failed while entering a step
    StepFailed,
}

/// Promotion error type
#[derive(Debug, Clone)]
pub struct PromotionError {
    /// Error kind
    pub kind: PromotionErrorKind,
    /// State the failed transition was entering
    pub step: Option<PromotionStep>,
    /// Error message
    pub message: String,
    /// Remote cause, for step failures
    pub cause: Option<ClientError>,
}

impl PromotionError {
    /// Create a forbidden transition error.
    pub fn forbidden_transition(from: &str, to: &str) -> Self {
        Self {
            kind: PromotionErrorKind::ForbiddenTransition,
            step: None,
            message: format!("forbidden transition: {} → {}", from, to),
            cause: None,
        }
    }

    /// Create a step failure: the remote call that enters `step` failed.
    pub fn step_failed(step: PromotionStep, cause: ClientError) -> Self {
        Self {
            kind: PromotionErrorKind::StepFailed,
            step: Some(step),
            message: format!("{} failed: {}", step.action(), cause),
            cause: Some(cause),
        }
    }

    /// Kind of the underlying remote error, if any.
    pub fn remote_kind(&self) -> Option<ClientErrorKind> {
        self.cause.as_ref().map(ClientError::kind)
    }

    /// Whether another attempt of the whole sequence could succeed.
    pub fn is_retryable(&self) -> bool {
        match (&self.kind, &self.cause) {
            (PromotionErrorKind::StepFailed, Some(cause)) => cause.is_retryable(),
            _ => false,
        }
    }

    /// State the index had reached when the failing step was attempted.
    pub fn reached(&self) -> PromotionStep {
        self.step
            .and_then(|s| s.previous())
            .unwrap_or(PromotionStep::Following)
    }
}

impl fmt::Display for PromotionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.step {
            Some(step) => write!(
                f,
                "PromotionError({:?}) entering {}: {}",
                self.kind,
                step.state_name(),
                self.message
            ),
            None => write!(f, "PromotionError({:?}): {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for PromotionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for promotion operations
pub type PromotionResult<T> = Result<T, PromotionError>;
