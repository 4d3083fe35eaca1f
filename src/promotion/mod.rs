//! Promotion Subsystem
//!
//! Converts follower indices into independent, writable indices.
//!
//! - The checkpoint validator gates promotion on leader/follower parity
//! - The state machine walks each index through an explicit, ordered
//!   sequence of remote transitions
//! - Indices are promoted one at a time; one index exhausting its retry
//!   budget never stops its siblings
//! - Every attempt, step and outcome is logged
//!
//! Parity is observed before promotion starts and is not re-checked right
//! before unfollow. Writes landing on the leader between validation and the
//! pause step are replicated; writes after the pause are not.

mod errors;
mod machine;
mod outcome;
mod retry;
mod state;
mod validator;

pub use errors::{PromotionError, PromotionErrorKind, PromotionResult};
pub use machine::PromotionStateMachine;
pub use outcome::{IndexPromotion, PromotionOutcome};
pub use retry::{Attempted, Backoff, RetryPolicy};
pub use state::PromotionStep;
pub use validator::{classify, CaughtUpStatus, CheckpointValidator, ValidationReport};
