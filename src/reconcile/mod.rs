//! Bootstrap Reconciliation
//!
//! Makes the follower cluster follow every open leader index it does not
//! already follow.
//!
//! - Both inventories are complete before any follow is issued
//! - Follow calls run concurrently with a bounded width
//! - One failed follow never cancels the others
//! - Outcomes are aggregated after every call has finished

mod engine;
mod errors;
mod plan;

pub use engine::{ReconcileSettings, ReconciliationEngine, ReconciliationReport, DEFAULT_CONCURRENCY};
pub use errors::{ReconcileError, ReconcileResult};
pub use plan::ReconciliationPlan;
