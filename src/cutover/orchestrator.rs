//! Cutover control loop.
//!
//! discover followers -> validate checkpoints -> confirmation gate ->
//! promote the caught-up set, one index at a time.
//!
//! Discovery reads the replication stats endpoint, the source of truth for
//! what is currently following. Lagging, dropped and unreadable indices are
//! never promoted. Dry run still discovers and validates so the plan can be
//! reviewed, but skips every prompt and every mutation.

use crate::client::{ClientResult, IndexName, IndexService};
use crate::observability::{json_list, log_event, Event};
use crate::promotion::{
    CheckpointValidator, IndexPromotion, PromotionStateMachine, RetryPolicy, ValidationReport,
};

use super::confirmation::Confirm;
use super::report::{CutoverReport, GateDecision};

#[derive(Debug, Clone, Copy)]
pub struct CutoverSettings {
    pub dry_run: bool,
    /// Skip the prompt and proceed as if affirmed.
    pub assume_yes: bool,
    pub promotion_retry: RetryPolicy,
}

impl Default for CutoverSettings {
    fn default() -> Self {
        Self {
            dry_run: false,
            assume_yes: false,
            promotion_retry: RetryPolicy::promotion_default(),
        }
    }
}

pub struct CutoverOrchestrator<'a, S: IndexService + ?Sized, C: Confirm + ?Sized> {
    service: &'a S,
    confirmer: &'a C,
    settings: CutoverSettings,
}

impl<'a, S, C> CutoverOrchestrator<'a, S, C>
where
    S: IndexService + ?Sized,
    C: Confirm + ?Sized,
{
    pub fn new(service: &'a S, confirmer: &'a C, settings: CutoverSettings) -> Self {
        Self {
            service,
            confirmer,
            settings,
        }
    }

    /// Discovery and validation only. Never prompts, never mutates.
    ///
    /// A discovery failure is returned: without the follower list there is
    /// nothing to reason about.
    pub async fn survey(&self) -> ClientResult<(Vec<IndexName>, ValidationReport)> {
        let discovered = self.service.discover_followers().await?;
        if discovered.is_empty() {
            log_event(Event::DiscoveryEmpty, &[]);
            return Ok((discovered, ValidationReport::default()));
        }
        log_event(
            Event::DiscoveryComplete,
            &[
                ("count", &discovered.len().to_string()),
                ("indices", &json_list(&discovered)),
            ],
        );
        let validation = CheckpointValidator::new(self.service)
            .validate(&discovered)
            .await;
        Ok((discovered, validation))
    }

    /// Full cutover.
    pub async fn run(&self) -> ClientResult<CutoverReport> {
        let (discovered, validation) = self.survey().await?;
        let mut report = CutoverReport {
            discovered,
            validation,
            dry_run: self.settings.dry_run,
            ..Default::default()
        };

        if report.validation.caught_up.is_empty() {
            self.summarize(&report);
            return Ok(report);
        }

        let decision = self.gate(&report.validation);
        report.gate = Some(decision);
        if decision == GateDecision::Declined {
            self.summarize(&report);
            return Ok(report);
        }

        let machine = PromotionStateMachine::new(
            self.service,
            self.settings.promotion_retry,
            self.settings.dry_run,
        );
        for index in &report.validation.caught_up {
            let outcome = machine.promote(index).await;
            report.promotions.push(IndexPromotion::new(index.clone(), outcome));
        }

        self.summarize(&report);
        Ok(report)
    }

    fn gate(&self, validation: &ValidationReport) -> GateDecision {
        let caught_up = validation.caught_up.len().to_string();
        let lagging = json_list(&validation.lagging);

        if self.settings.dry_run || self.settings.assume_yes {
            let reason = if self.settings.dry_run {
                "dry_run"
            } else {
                "assume_yes"
            };
            log_event(
                Event::ConfirmationBypassed,
                &[
                    ("reason", reason),
                    ("caught_up", &caught_up),
                    ("lagging", &lagging),
                ],
            );
            return GateDecision::Bypassed;
        }

        let prompt = if validation.all_caught_up() {
            format!(
                "All {} follower indices are caught up. Proceed with promotion?",
                caught_up
            )
        } else {
            format!(
                "Follower indices are not caught up yet: {}. Promote only the {} caught-up indices?",
                lagging, caught_up
            )
        };

        if self.confirmer.confirm(&prompt) {
            log_event(
                Event::ConfirmationAccepted,
                &[("caught_up", &caught_up), ("lagging", &lagging)],
            );
            GateDecision::Accepted
        } else {
            log_event(
                Event::ConfirmationDeclined,
                &[("caught_up", &caught_up), ("lagging", &lagging)],
            );
            GateDecision::Declined
        }
    }

    fn summarize(&self, report: &CutoverReport) {
        let v = &report.validation;
        log_event(
            Event::CutoverSummary,
            &[
                ("discovered", &report.discovered.len().to_string()),
                ("caught_up", &v.caught_up.len().to_string()),
                ("lagging", &json_list(&v.lagging)),
                ("dropped", &json_list(&v.dropped)),
                ("fetch_failed", &json_list(&v.fetch_failed)),
                ("gate", report.gate.map_or("-", |g| g.as_str())),
                ("promoted", &json_list(report.promoted())),
                ("failed", &json_list(report.failed())),
                ("skipped", &report.skipped_count().to_string()),
                ("manual_completion", &json_list(report.manual_completion())),
                ("dry_run", if report.dry_run { "true" } else { "false" }),
                ("status", report.status().as_str()),
            ],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ClientError, InMemoryIndexService, Operation, ShardCheckpoint};
    use crate::cutover::confirmation::{AssumeYes, ScriptedConfirmer};
    use crate::status::RunStatus;

    fn cluster() -> InMemoryIndexService {
        InMemoryIndexService::new()
            .with_follower("fresh", "fresh", "rc1", vec![ShardCheckpoint::new(0, 7, 7)])
            .with_follower(
                "behind",
                "behind",
                "rc1",
                vec![ShardCheckpoint::new(0, 9, 4)],
            )
    }

    fn settings() -> CutoverSettings {
        CutoverSettings {
            promotion_retry: RetryPolicy::immediate(3),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_lagging_gate_promotes_only_caught_up() {
        let svc = cluster();
        let confirmer = ScriptedConfirmer::new([true]);
        let orchestrator = CutoverOrchestrator::new(&svc, &confirmer, settings());

        let report = orchestrator.run().await.unwrap();
        assert_eq!(report.gate, Some(GateDecision::Accepted));
        let promoted: Vec<_> = report.promoted().map(IndexName::as_str).collect();
        assert_eq!(promoted, vec!["fresh"]);
        assert!(svc.operations_on("behind").iter().all(|op| !op.is_mutating()));
        assert!(confirmer.prompts()[0].contains("behind"));
        assert_eq!(report.status(), RunStatus::Completed);
    }

    #[tokio::test]
    async fn test_decline_mutates_nothing() {
        let svc = cluster();
        let confirmer = ScriptedConfirmer::new([false]);
        let orchestrator = CutoverOrchestrator::new(&svc, &confirmer, settings());

        let report = orchestrator.run().await.unwrap();
        assert_eq!(report.status(), RunStatus::Aborted);
        assert!(svc.mutating_calls().is_empty());
    }

    #[tokio::test]
    async fn test_assume_yes_bypasses_prompt() {
        let svc = cluster();
        let orchestrator = CutoverOrchestrator::new(
            &svc,
            &AssumeYes,
            CutoverSettings {
                assume_yes: true,
                ..settings()
            },
        );

        let report = orchestrator.run().await.unwrap();
        assert_eq!(report.gate, Some(GateDecision::Bypassed));
        assert_eq!(report.promoted().count(), 1);
    }

    #[tokio::test]
    async fn test_failed_promotion_is_partial_failure() {
        let svc = InMemoryIndexService::new()
            .with_follower("a", "a", "rc1", vec![ShardCheckpoint::new(0, 3, 3)])
            .with_follower("b", "b", "rc1", vec![ShardCheckpoint::new(0, 5, 5)]);
        svc.fail_always(
            Operation::CloseIndex,
            Some("a"),
            ClientError::service("/a/_close", 500, "shard busy"),
        );
        let orchestrator = CutoverOrchestrator::new(
            &svc,
            &AssumeYes,
            CutoverSettings {
                assume_yes: true,
                ..settings()
            },
        );

        let report = orchestrator.run().await.unwrap();
        let failed: Vec<_> = report.failed().map(IndexName::as_str).collect();
        let promoted: Vec<_> = report.promoted().map(IndexName::as_str).collect();
        assert_eq!(failed, vec!["a"]);
        assert_eq!(promoted, vec!["b"]);
        assert_eq!(report.status(), RunStatus::PartialFailure);
        assert_eq!(report.status().exit_code(), 1);
    }

    #[tokio::test]
    async fn test_nothing_caught_up_never_prompts() {
        let svc = InMemoryIndexService::new().with_follower(
            "behind",
            "behind",
            "rc1",
            vec![ShardCheckpoint::new(0, 9, 4)],
        );
        let confirmer = ScriptedConfirmer::new([true]);
        let orchestrator = CutoverOrchestrator::new(&svc, &confirmer, settings());

        let report = orchestrator.run().await.unwrap();
        assert_eq!(report.status(), RunStatus::NothingToDo);
        assert!(confirmer.prompts().is_empty());
    }
}
