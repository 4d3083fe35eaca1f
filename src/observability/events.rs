//! Observable events
//!
//! Every log line names exactly one of these. Names are stable so log
//! pipelines can key on them.

use std::fmt;

use super::logger::Severity;

/// Observable events across cutover and bootstrap runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    /// Configuration loaded and validated
    ConfigLoaded,
    /// Run started
    RunStart,
    /// Run finished with a final status
    RunComplete,
    /// Run aborted by a fatal error
    RunFailed,

    // Discovery
    /// Follower indices discovered from replication stats
    DiscoveryComplete,
    /// Nothing is currently following
    DiscoveryEmpty,

    // Checkpoint validation
    /// Follower is in checkpoint parity with its leader
    CheckpointCaughtUp,
    /// Follower trails its leader on at least one shard
    CheckpointLagging,
    /// Follower reported zero shards and was dropped
    CheckpointNoShards,
    /// Checkpoint fetch failed; index treated as lagging
    CheckpointFetchFailed,
    /// Validation finished
    ValidationComplete,

    // Confirmation gate
    /// Operator confirmed
    ConfirmationAccepted,
    /// Operator declined; nothing was changed
    ConfirmationDeclined,
    /// Prompt skipped by dry run or assume-yes
    ConfirmationBypassed,

    // Promotion
    /// Promotion attempt begins
    PromotionAttempt,
    /// One step of the promotion sequence completed
    PromotionStep,
    /// Index closed: aborting now leaves an interim state
    PromotionPointOfNoReturn,
    /// One attempt failed
    PromotionAttemptFailed,
    /// Index promoted to an independent writable index
    PromotionSucceeded,
    /// Retry budget exhausted
    PromotionFailed,
    /// Dry run: promotion not executed
    PromotionSkipped,
    /// Summary of a cutover run
    CutoverSummary,

    // Reconciliation
    /// Inventory listing succeeded
    InventoryFetched,
    /// Inventory listing attempt failed
    InventoryFetchFailed,
    /// Reconciliation plan computed
    ReconcilePlan,
    /// Follow relationship established
    FollowEstablished,
    /// Follow relationship could not be established
    FollowFailed,
    /// Summary of a bootstrap run
    ReconcileSummary,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::RunStart => "RUN_BEGIN",
            Event::RunComplete => "RUN_COMPLETE",
            Event::RunFailed => "RUN_FAILED",

            Event::DiscoveryComplete => "DISCOVERY_COMPLETE",
            Event::DiscoveryEmpty => "DISCOVERY_EMPTY",

            Event::CheckpointCaughtUp => "CHECKPOINT_CAUGHT_UP",
            Event::CheckpointLagging => "CHECKPOINT_LAGGING",
            Event::CheckpointNoShards => "CHECKPOINT_NO_SHARDS",
            Event::CheckpointFetchFailed => "CHECKPOINT_FETCH_FAILED",
            Event::ValidationComplete => "VALIDATION_COMPLETE",

            Event::ConfirmationAccepted => "CONFIRMATION_ACCEPTED",
            Event::ConfirmationDeclined => "CONFIRMATION_DECLINED",
            Event::ConfirmationBypassed => "CONFIRMATION_BYPASSED",

            Event::PromotionAttempt => "PROMOTION_ATTEMPT",
            Event::PromotionStep => "PROMOTION_STEP",
            Event::PromotionPointOfNoReturn => "PROMOTION_POINT_OF_NO_RETURN",
            Event::PromotionAttemptFailed => "PROMOTION_ATTEMPT_FAILED",
            Event::PromotionSucceeded => "PROMOTION_SUCCEEDED",
            Event::PromotionFailed => "PROMOTION_FAILED",
            Event::PromotionSkipped => "PROMOTION_SKIPPED",
            Event::CutoverSummary => "CUTOVER_SUMMARY",

            Event::InventoryFetched => "INVENTORY_FETCHED",
            Event::InventoryFetchFailed => "INVENTORY_FETCH_FAILED",
            Event::ReconcilePlan => "RECONCILE_PLAN",
            Event::FollowEstablished => "FOLLOW_ESTABLISHED",
            Event::FollowFailed => "FOLLOW_FAILED",
            Event::ReconcileSummary => "RECONCILE_SUMMARY",
        }
    }

    /// Severity the event is logged at.
    pub fn severity(&self) -> Severity {
        match self {
            Event::RunFailed
            | Event::CheckpointFetchFailed
            | Event::PromotionAttemptFailed
            | Event::PromotionFailed
            | Event::InventoryFetchFailed
            | Event::FollowFailed => Severity::Error,

            Event::CheckpointLagging
            | Event::CheckpointNoShards
            | Event::ConfirmationDeclined
            | Event::PromotionPointOfNoReturn => Severity::Warn,

            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
