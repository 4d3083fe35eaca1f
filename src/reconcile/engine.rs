//! Bootstrap reconciliation driver.
//!
//! 1. list open leader indices (retried with backoff; fatal if exhausted)
//! 2. list follow relationships on the follower cluster
//! 3. plan = leader indices nothing follows yet
//! 4. establish every planned follow concurrently, bounded by the configured
//!    width, and aggregate once every call has finished
//!
//! No follow call is issued before both inventories are complete.

use std::collections::{BTreeMap, BTreeSet};

use futures_util::stream::{self, StreamExt};

use crate::client::{ClientError, FollowRelationship, IndexName, IndexService};
use crate::observability::{json_list, log_event, Event};
use crate::promotion::{PromotionStateMachine, RetryPolicy};
use crate::status::RunStatus;

use super::errors::{ReconcileError, ReconcileResult};
use super::plan::ReconciliationPlan;

/// Default number of follow calls in flight.
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Knobs for one bootstrap run.
#[derive(Debug, Clone)]
pub struct ReconcileSettings {
    /// Name under which the follower cluster knows the leader.
    pub remote_cluster: String,
    pub concurrency: usize,
    pub dry_run: bool,
    pub inventory_retry: RetryPolicy,
}

impl ReconcileSettings {
    pub fn new(remote_cluster: impl Into<String>) -> Self {
        Self {
            remote_cluster: remote_cluster.into(),
            concurrency: DEFAULT_CONCURRENCY,
            dry_run: false,
            inventory_retry: RetryPolicy::inventory_default(),
        }
    }
}

/// Result of a bootstrap run.
#[derive(Debug, Clone, Default)]
pub struct ReconciliationReport {
    pub plan: ReconciliationPlan,
    pub leader_count: usize,
    pub existing_count: usize,
    pub established: BTreeSet<IndexName>,
    pub failed: BTreeMap<IndexName, ClientError>,
    pub dry_run: bool,
}

impl ReconciliationReport {
    pub fn status(&self) -> RunStatus {
        if self.plan.is_empty() {
            RunStatus::NothingToDo
        } else if self.failed.is_empty() {
            RunStatus::Completed
        } else {
            RunStatus::PartialFailure
        }
    }
}

pub struct ReconciliationEngine<'a, L: IndexService + ?Sized, F: IndexService + ?Sized> {
    leader: &'a L,
    follower: &'a F,
    settings: ReconcileSettings,
}

impl<'a, L, F> ReconciliationEngine<'a, L, F>
where
    L: IndexService + ?Sized,
    F: IndexService + ?Sized,
{
    pub fn new(leader: &'a L, follower: &'a F, settings: ReconcileSettings) -> Self {
        Self {
            leader,
            follower,
            settings,
        }
    }

    /// Plan, then execute unless dry run.
    pub async fn run(&self) -> ReconcileResult<ReconciliationReport> {
        let (leader_open, existing) = self.inventory().await?;
        let leader_count = leader_open.len();
        let existing_count = existing.len();
        let plan = ReconciliationPlan::compute(leader_open, &existing);

        log_event(
            Event::ReconcilePlan,
            &[
                ("remote_cluster", &self.settings.remote_cluster),
                ("leader_count", &leader_count.to_string()),
                ("existing_count", &existing_count.to_string()),
                ("plan_count", &plan.len().to_string()),
                ("plan", &json_list(&plan.to_establish)),
                ("dry_run", if self.settings.dry_run { "true" } else { "false" }),
            ],
        );

        let mut report = ReconciliationReport {
            leader_count,
            existing_count,
            dry_run: self.settings.dry_run,
            ..Default::default()
        };
        if !self.settings.dry_run && !plan.is_empty() {
            self.execute(&plan, &mut report).await;
        }
        report.plan = plan;

        log_event(
            Event::ReconcileSummary,
            &[
                ("existing_count", &report.existing_count.to_string()),
                ("leader_count", &report.leader_count.to_string()),
                ("plan_count", &report.plan.len().to_string()),
                ("established", &json_list(&report.established)),
                ("failed", &json_list(report.failed.keys())),
                ("status", report.status().as_str()),
            ],
        );
        Ok(report)
    }

    /// Leader open indices and follower relationships, in that order.
    async fn inventory(&self) -> ReconcileResult<(Vec<IndexName>, Vec<FollowRelationship>)> {
        let policy = self.settings.inventory_retry;
        let budget = policy.max_attempts.to_string();
        let leader_open = policy
            .run(
                |_| self.leader.list_open_indices(),
                |attempt, err: &ClientError| {
                    log_event(
                        Event::InventoryFetchFailed,
                        &[
                            ("cluster", "leader"),
                            ("attempt", &attempt.to_string()),
                            ("max_attempts", &budget),
                            ("error", &err.to_string()),
                        ],
                    );
                    true
                },
            )
            .await
            .map_err(|failed| ReconcileError::LeaderInventory {
                attempts: failed.attempts,
                source: failed.value,
            })?
            .value;
        log_event(
            Event::InventoryFetched,
            &[
                ("cluster", "leader"),
                ("count", &leader_open.len().to_string()),
            ],
        );

        let existing = match self.follower.list_follow_relationships().await {
            Ok(existing) => existing,
            Err(source) => {
                log_event(
                    Event::InventoryFetchFailed,
                    &[
                        ("cluster", "follower"),
                        ("attempt", "1"),
                        ("max_attempts", "1"),
                        ("error", &source.to_string()),
                    ],
                );
                return Err(ReconcileError::FollowerInventory { source });
            }
        };
        log_event(
            Event::InventoryFetched,
            &[
                ("cluster", "follower"),
                ("count", &existing.len().to_string()),
            ],
        );

        Ok((leader_open, existing))
    }

    /// Dispatch every planned follow; a failure never cancels siblings.
    async fn execute(&self, plan: &ReconciliationPlan, report: &mut ReconciliationReport) {
        let machine = PromotionStateMachine::new(self.follower, RetryPolicy::immediate(1), false);
        let machine = &machine;
        let remote_cluster = self.settings.remote_cluster.as_str();
        let width = self.settings.concurrency.max(1);

        let results: Vec<_> = stream::iter(plan.to_establish.iter().cloned())
            .map(move |index| async move {
                let result = machine.establish_follow(&index, remote_cluster).await;
                (index, result)
            })
            .buffer_unordered(width)
            .collect()
            .await;

        for (index, result) in results {
            match result {
                Ok(relationship) => {
                    log_event(
                        Event::FollowEstablished,
                        &[
                            ("index", index.as_str()),
                            ("leader_index", relationship.leader_index.as_str()),
                            ("remote_cluster", &relationship.remote_cluster),
                        ],
                    );
                    report.established.insert(index);
                }
                Err(err) => {
                    log_event(
                        Event::FollowFailed,
                        &[("index", index.as_str()), ("error", &err.to_string())],
                    );
                    report.failed.insert(index, err);
                }
            }
        }
    }
}
