//! Promotion State Machine driver
//!
//! Executes the ordered promotion sequence against one index:
//!
//! 1. pause replication (an already-paused follower counts as paused)
//! 2. capture alias bindings (must succeed; otherwise aliases would be lost)
//! 3. close
//! 4. unfollow (irreversible)
//! 5. reopen
//! 6. reapply every captured alias
//! 7. clear the write block
//!
//! A failure at any step fails the attempt; the next attempt restarts the
//! whole sequence from step 1. Re-running pause and close on an index that
//! is already paused or closed is assumed to be accepted by the remote
//! service. Once step 4 has succeeded, pause no longer applies to the index,
//! so a retry after that point fails at step 1 and the index needs manual
//! completion; such failures are flagged.
//!
//! Dry run performs no remote call at all.

use crate::client::{AliasSnapshot, ClientResult, FollowRelationship, IndexName, IndexService};
use crate::observability::{json_list, log_event, Event};

use super::errors::{PromotionError, PromotionResult};
use super::outcome::PromotionOutcome;
use super::retry::RetryPolicy;
use super::state::PromotionStep;

/// Drives promotions one index at a time.
pub struct PromotionStateMachine<'a, S: IndexService + ?Sized> {
    service: &'a S,
    policy: RetryPolicy,
    dry_run: bool,
}

impl<'a, S: IndexService + ?Sized> PromotionStateMachine<'a, S> {
    pub fn new(service: &'a S, policy: RetryPolicy, dry_run: bool) -> Self {
        Self {
            service,
            policy,
            dry_run,
        }
    }

    /// Promote `index`, retrying the whole sequence within the budget.
    ///
    /// Never returns an error: exhaustion is reported as
    /// [`PromotionOutcome::Failed`] so sibling indices keep going.
    pub async fn promote(&self, index: &IndexName) -> PromotionOutcome {
        if self.dry_run {
            log_event(
                Event::PromotionSkipped,
                &[("index", index.as_str()), ("reason", "dry_run")],
            );
            return PromotionOutcome::SkippedDryRun;
        }

        let budget = self.policy.max_attempts.to_string();
        let mut furthest = PromotionStep::Following;
        let result = self
            .policy
            .run(
                |attempt| self.attempt(index, attempt),
                |attempt, err: &PromotionError| {
                    furthest = furthest.max(err.reached());
                    log_event(
                        Event::PromotionAttemptFailed,
                        &[
                            ("index", index.as_str()),
                            ("attempt", &attempt.to_string()),
                            ("max_attempts", &budget),
                            ("step", err.step.map_or("-", |s| s.state_name())),
                            ("reached", err.reached().state_name()),
                            ("error_kind", err.remote_kind().map_or("-", |k| k.as_str())),
                            ("error", &err.to_string()),
                        ],
                    );
                    err.is_retryable()
                },
            )
            .await;

        match result {
            Ok(done) => {
                log_event(
                    Event::PromotionSucceeded,
                    &[
                        ("index", index.as_str()),
                        ("attempts", &done.attempts.to_string()),
                    ],
                );
                PromotionOutcome::Succeeded {
                    attempts: done.attempts,
                }
            }
            Err(failed) => {
                let outcome = PromotionOutcome::Failed {
                    last_error: failed.value,
                    attempts_used: failed.attempts,
                    furthest,
                };
                if let PromotionOutcome::Failed { last_error, .. } = &outcome {
                    log_event(
                        Event::PromotionFailed,
                        &[
                            ("index", index.as_str()),
                            ("attempts", &failed.attempts.to_string()),
                            ("step", last_error.step.map_or("-", |s| s.state_name())),
                            ("furthest", furthest.state_name()),
                            ("severed", bool_str(furthest.is_severed())),
                            ("error", &last_error.to_string()),
                            (
                                "manual_completion",
                                bool_str(outcome.requires_manual_completion()),
                            ),
                        ],
                    );
                }
                outcome
            }
        }
    }

    /// One full pass of the sequence. Returns the terminal state.
    async fn attempt(&self, index: &IndexName, attempt: u32) -> PromotionResult<PromotionStep> {
        log_event(
            Event::PromotionAttempt,
            &[("index", index.as_str()), ("attempt", &attempt.to_string())],
        );
        let svc = self.service;
        let mut state = PromotionStep::Following;

        match svc.pause_follow(index).await {
            Err(e) if e.is_already_paused() => {
                self.enter(index, &mut state, PromotionStep::Paused, Ok(()), Some("already_paused"))?
            }
            result => self.enter(index, &mut state, PromotionStep::Paused, result, None)?,
        }

        let snapshot = match svc.get_aliases(index).await {
            Ok(snapshot) => snapshot,
            Err(e) => return Err(PromotionError::step_failed(PromotionStep::AliasesCaptured, e)),
        };
        let captured = json_list(snapshot.names());
        self.enter(
            index,
            &mut state,
            PromotionStep::AliasesCaptured,
            Ok(()),
            Some(&captured),
        )?;

        let result = svc.close_index(index).await;
        self.enter(index, &mut state, PromotionStep::Closed, result, None)?;
        log_event(
            Event::PromotionPointOfNoReturn,
            &[
                ("index", index.as_str()),
                (
                    "detail",
                    "index is closed; aborting before writes are enabled leaves it closed or unfollowed and requires manual completion",
                ),
            ],
        );

        let result = svc.unfollow(index).await;
        self.enter(index, &mut state, PromotionStep::Unfollowed, result, None)?;

        let result = svc.open_index(index).await;
        self.enter(index, &mut state, PromotionStep::Reopened, result, None)?;

        let result = self.restore_aliases(&snapshot).await;
        self.enter(index, &mut state, PromotionStep::AliasesRestored, result, None)?;

        let result = svc.set_write_block(index, false).await;
        self.enter(index, &mut state, PromotionStep::WritesEnabled, result, None)?;

        Ok(state)
    }

    /// Record the outcome of the remote call that enters `to`.
    fn enter(
        &self,
        index: &IndexName,
        state: &mut PromotionStep,
        to: PromotionStep,
        result: ClientResult<()>,
        detail: Option<&str>,
    ) -> PromotionResult<()> {
        result.map_err(|e| PromotionError::step_failed(to, e))?;
        *state = state.advance(to)?;
        log_event(
            Event::PromotionStep,
            &[
                ("index", index.as_str()),
                ("state", state.state_name()),
                ("detail", detail.unwrap_or("")),
            ],
        );
        Ok(())
    }

    async fn restore_aliases(&self, snapshot: &AliasSnapshot) -> ClientResult<()> {
        for (alias, definition) in &snapshot.aliases {
            self.service
                .put_alias(&snapshot.index, alias, definition)
                .await?;
        }
        Ok(())
    }

    /// Start following `leader_index` from `remote_cluster`. Single call,
    /// never retried: a half-applied follow must be inspected before any
    /// second attempt.
    pub async fn establish_follow(
        &self,
        leader_index: &IndexName,
        remote_cluster: &str,
    ) -> ClientResult<FollowRelationship> {
        self.service.put_follow(leader_index, remote_cluster).await
    }
}

fn bool_str(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}
