//! Cutover Orchestration
//!
//! Turns every caught-up follower index into an independent, writable index
//! after explicit operator confirmation.
//!
//! - Only indices in checkpoint parity are promoted
//! - Declining at the gate changes nothing
//! - Promotions run strictly one after another

mod confirmation;
mod orchestrator;
mod report;

pub use confirmation::{is_affirmative, AssumeYes, Confirm, ScriptedConfirmer, StdinConfirmer};
pub use orchestrator::{CutoverOrchestrator, CutoverSettings};
pub use report::{CutoverReport, GateDecision};
