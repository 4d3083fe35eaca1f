//! Cutover run report.

use crate::client::IndexName;
use crate::promotion::{IndexPromotion, ValidationReport};
use crate::status::RunStatus;

/// How the confirmation gate was passed, if it was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Accepted,
    Declined,
    /// Prompt skipped by dry run or `--yes`.
    Bypassed,
}

impl GateDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::Declined => "declined",
            Self::Bypassed => "bypassed",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CutoverReport {
    /// Followers reported by the replication stats endpoint.
    pub discovered: Vec<IndexName>,
    pub validation: ValidationReport,
    /// `None` when the run ended before the gate.
    pub gate: Option<GateDecision>,
    /// One entry per caught-up index, in promotion order.
    pub promotions: Vec<IndexPromotion>,
    pub dry_run: bool,
}

impl CutoverReport {
    pub fn promoted(&self) -> impl Iterator<Item = &IndexName> {
        self.promotions
            .iter()
            .filter(|p| p.outcome.is_success())
            .map(|p| &p.index)
    }

    pub fn failed(&self) -> impl Iterator<Item = &IndexName> {
        self.promotions
            .iter()
            .filter(|p| p.outcome.is_failure())
            .map(|p| &p.index)
    }

    /// Indices left closed or unfollowed.
    pub fn manual_completion(&self) -> impl Iterator<Item = &IndexName> {
        self.promotions
            .iter()
            .filter(|p| p.outcome.requires_manual_completion())
            .map(|p| &p.index)
    }

    pub fn skipped_count(&self) -> usize {
        self.promotions.len() - self.promoted().count() - self.failed().count()
    }

    /// A decline wins over everything. Otherwise any failed promotion or
    /// unreadable follower makes the run partial, even when nothing was
    /// caught up.
    pub fn status(&self) -> RunStatus {
        let degraded =
            self.failed().next().is_some() || !self.validation.fetch_failed.is_empty();
        match self.gate {
            Some(GateDecision::Declined) => RunStatus::Aborted,
            _ if degraded => RunStatus::PartialFailure,
            None => RunStatus::NothingToDo,
            Some(_) => RunStatus::Completed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientError;
    use crate::promotion::{PromotionError, PromotionOutcome, PromotionStep};

    fn failed(step: PromotionStep, furthest: PromotionStep) -> PromotionOutcome {
        PromotionOutcome::Failed {
            last_error: PromotionError::step_failed(
                step,
                ClientError::connectivity("/x/_open", "reset"),
            ),
            attempts_used: 3,
            furthest,
        }
    }

    #[test]
    fn test_status_without_gate_is_nothing_to_do() {
        assert_eq!(CutoverReport::default().status(), RunStatus::NothingToDo);
    }

    #[test]
    fn test_status_unreadable_followers_is_partial() {
        let mut report = CutoverReport::default();
        report.validation.lagging.insert("a".into());
        report.validation.fetch_failed.insert("a".into());
        assert_eq!(report.status(), RunStatus::PartialFailure);

        report.gate = Some(GateDecision::Bypassed);
        assert_eq!(report.status(), RunStatus::PartialFailure);

        report.gate = Some(GateDecision::Declined);
        assert_eq!(report.status(), RunStatus::Aborted);
    }

    #[test]
    fn test_status_declined_is_aborted() {
        let report = CutoverReport {
            gate: Some(GateDecision::Declined),
            ..Default::default()
        };
        assert_eq!(report.status(), RunStatus::Aborted);
    }

    #[test]
    fn test_counts_and_manual_completion() {
        let report = CutoverReport {
            gate: Some(GateDecision::Accepted),
            promotions: vec![
                IndexPromotion::new("a".into(), PromotionOutcome::Succeeded { attempts: 1 }),
                IndexPromotion::new(
                    "b".into(),
                    failed(PromotionStep::Reopened, PromotionStep::Unfollowed),
                ),
                IndexPromotion::new(
                    "c".into(),
                    failed(PromotionStep::Paused, PromotionStep::Following),
                ),
            ],
            ..Default::default()
        };
        assert_eq!(report.promoted().count(), 1);
        assert_eq!(report.failed().count(), 2);
        assert_eq!(report.skipped_count(), 0);
        let manual: Vec<_> = report.manual_completion().map(IndexName::as_str).collect();
        assert_eq!(manual, vec!["b"]);
        assert_eq!(report.status(), RunStatus::PartialFailure);
    }
}
