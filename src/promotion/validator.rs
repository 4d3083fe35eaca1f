//! Checkpoint Validator
//!
//! Gates promotion on checkpoint parity between each follower and its leader.
//!
//! An index is caught up iff it reports at least one shard and every shard's
//! leader global checkpoint equals its follower global checkpoint. The result
//! is a point-in-time observation: checkpoints keep moving until replication
//! is paused.
//!
//! Partial-failure isolation: a failed fetch marks that index lagging and is
//! logged; validation of the other indices continues.

use std::collections::BTreeSet;

use crate::client::{IndexName, IndexService, ShardCheckpoint};
use crate::observability::{json_list, log_event, Event};

/// Parity status of one follower index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaughtUpStatus {
    CaughtUp,
    Lagging,
}

/// Classify a shard checkpoint sequence. `None` for zero shards: parity over
/// nothing is not a meaningful guarantee.
pub fn classify(shards: &[ShardCheckpoint]) -> Option<CaughtUpStatus> {
    if shards.is_empty() {
        return None;
    }
    if shards.iter().all(ShardCheckpoint::in_parity) {
        Some(CaughtUpStatus::CaughtUp)
    } else {
        Some(CaughtUpStatus::Lagging)
    }
}

/// Partition of the validated indices.
///
/// `caught_up` and `lagging` are disjoint; together with `dropped` they
/// cover exactly the distinct input indices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub caught_up: BTreeSet<IndexName>,
    pub lagging: BTreeSet<IndexName>,
    /// Indices that reported zero shards.
    pub dropped: BTreeSet<IndexName>,
    /// Lagging because the checkpoint fetch failed, not because of lag.
    pub fetch_failed: BTreeSet<IndexName>,
}

impl ValidationReport {
    pub fn all_caught_up(&self) -> bool {
        self.lagging.is_empty()
    }
}

/// Reads checkpoints through `S` and partitions follower indices.
pub struct CheckpointValidator<'a, S: IndexService + ?Sized> {
    service: &'a S,
}

impl<'a, S: IndexService + ?Sized> CheckpointValidator<'a, S> {
    pub fn new(service: &'a S) -> Self {
        Self { service }
    }

    /// Validate each index with a fresh checkpoint read.
    pub async fn validate(&self, indices: &[IndexName]) -> ValidationReport {
        let mut report = ValidationReport::default();

        for index in indices {
            if report.caught_up.contains(index)
                || report.lagging.contains(index)
                || report.dropped.contains(index)
            {
                continue;
            }

            let shards = match self.service.get_checkpoints(index).await {
                Ok(shards) => shards,
                Err(e) => {
                    log_event(
                        Event::CheckpointFetchFailed,
                        &[
                            ("index", index.as_str()),
                            ("error_kind", e.kind().as_str()),
                            ("error", &e.to_string()),
                        ],
                    );
                    report.lagging.insert(index.clone());
                    report.fetch_failed.insert(index.clone());
                    continue;
                }
            };

            match classify(&shards) {
                Some(CaughtUpStatus::CaughtUp) => {
                    log_event(
                        Event::CheckpointCaughtUp,
                        &[("index", index.as_str()), ("shards", &shards.len().to_string())],
                    );
                    report.caught_up.insert(index.clone());
                }
                Some(CaughtUpStatus::Lagging) => {
                    let behind: Vec<&ShardCheckpoint> =
                        shards.iter().filter(|s| !s.in_parity()).collect();
                    let max_lag = behind.iter().map(|s| s.lag()).max().unwrap_or(0);
                    log_event(
                        Event::CheckpointLagging,
                        &[
                            ("index", index.as_str()),
                            ("lagging_shards", &json_list(behind.iter().map(|s| s.shard_id))),
                            ("max_lag", &max_lag.to_string()),
                        ],
                    );
                    report.lagging.insert(index.clone());
                }
                None => {
                    log_event(Event::CheckpointNoShards, &[("index", index.as_str())]);
                    report.dropped.insert(index.clone());
                }
            }
        }

        log_event(
            Event::ValidationComplete,
            &[
                ("caught_up", &json_list(&report.caught_up)),
                ("lagging", &json_list(&report.lagging)),
                ("dropped", &json_list(&report.dropped)),
            ],
        );

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ClientError, InMemoryIndexService, Operation};

    fn shards(pairs: &[(i64, i64)]) -> Vec<ShardCheckpoint> {
        pairs
            .iter()
            .enumerate()
            .map(|(i, (l, f))| ShardCheckpoint::new(i as u32, *l, *f))
            .collect()
    }

    fn names(list: &[&str]) -> Vec<IndexName> {
        list.iter().map(|s| IndexName::from(*s)).collect()
    }

    fn set(list: &[&str]) -> BTreeSet<IndexName> {
        names(list).into_iter().collect()
    }

    #[test]
    fn test_classify_all_equal_is_caught_up() {
        assert_eq!(
            classify(&shards(&[(10, 10), (0, 0), (-1, -1)])),
            Some(CaughtUpStatus::CaughtUp)
        );
    }

    #[test]
    fn test_classify_any_difference_is_lagging() {
        assert_eq!(
            classify(&shards(&[(10, 10), (11, 10)])),
            Some(CaughtUpStatus::Lagging)
        );
        // A follower ahead of its leader's last observation is still not parity.
        assert_eq!(classify(&shards(&[(5, 6)])), Some(CaughtUpStatus::Lagging));
    }

    #[test]
    fn test_classify_empty_is_unclassified() {
        assert_eq!(classify(&[]), None);
    }

    #[test]
    fn test_classify_matches_parity_property() {
        // Exhaustive over small checkpoint grids.
        let values = [-1i64, 0, 1, 2];
        for a in values {
            for b in values {
                for c in values {
                    for d in values {
                        let s = shards(&[(a, b), (c, d)]);
                        let expected = if a == b && c == d {
                            CaughtUpStatus::CaughtUp
                        } else {
                            CaughtUpStatus::Lagging
                        };
                        assert_eq!(classify(&s), Some(expected));
                    }
                }
            }
        }
    }

    #[tokio::test]
    async fn test_validate_partitions_indices() {
        let svc = InMemoryIndexService::new()
            .with_follower("a", "a", "rc1", shards(&[(5, 5), (7, 7)]))
            .with_follower("b", "b", "rc1", shards(&[(5, 4)]))
            .with_follower("c", "c", "rc1", vec![]);

        let report = CheckpointValidator::new(&svc)
            .validate(&names(&["a", "b", "c"]))
            .await;

        assert_eq!(report.caught_up, set(&["a"]));
        assert_eq!(report.lagging, set(&["b"]));
        assert_eq!(report.dropped, set(&["c"]));
        assert!(!report.all_caught_up());
    }

    #[tokio::test]
    async fn test_fetch_failure_is_lagging_and_isolated() {
        let svc = InMemoryIndexService::new()
            .with_follower("a", "a", "rc1", shards(&[(1, 1)]))
            .with_follower("b", "b", "rc1", shards(&[(1, 1)]));
        svc.fail_always(
            Operation::GetCheckpoints,
            Some("a"),
            ClientError::connectivity("/a/_ccr/stats", "timed out"),
        );

        let report = CheckpointValidator::new(&svc)
            .validate(&names(&["a", "b"]))
            .await;

        assert!(report.lagging.contains("a"));
        assert!(report.fetch_failed.contains("a"));
        assert!(report.caught_up.contains("b"));
    }

    #[tokio::test]
    async fn test_non_follower_is_lagging() {
        let svc = InMemoryIndexService::new().with_index("plain", true);
        let report = CheckpointValidator::new(&svc)
            .validate(&names(&["plain", "missing"]))
            .await;
        assert_eq!(report.lagging.len(), 2);
        assert!(report.caught_up.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_inputs_read_once() {
        let svc = InMemoryIndexService::new().with_follower("a", "a", "rc1", shards(&[(3, 3)]));
        let report = CheckpointValidator::new(&svc)
            .validate(&names(&["a", "a"]))
            .await;
        assert_eq!(report.caught_up.len(), 1);
        assert_eq!(svc.operations_on("a"), vec![Operation::GetCheckpoints]);
    }
}
