//! Bootstrap Reconciliation Tests
//!
//! The follower cluster ends up following every open leader index it did not
//! already follow. Follow calls run concurrently; one failure is recorded and
//! never cancels the others.

use ccr_cutover::client::{ClientError, InMemoryIndexService, Operation, ShardCheckpoint};
use ccr_cutover::promotion::RetryPolicy;
use ccr_cutover::reconcile::{ReconcileError, ReconcileSettings, ReconciliationEngine};
use ccr_cutover::status::RunStatus;

fn leader(open: &[&str], closed: &[&str]) -> InMemoryIndexService {
    let svc = open
        .iter()
        .fold(InMemoryIndexService::new(), |svc, name| svc.with_index(name, true));
    closed.iter().fold(svc, |svc, name| svc.with_index(name, false))
}

fn follower_of(names: &[&str]) -> InMemoryIndexService {
    names.iter().fold(InMemoryIndexService::new(), |svc, name| {
        svc.with_follower(name, name, "rc1", vec![ShardCheckpoint::new(0, 1, 1)])
    })
}

fn settings() -> ReconcileSettings {
    ReconcileSettings {
        inventory_retry: RetryPolicy::immediate(3),
        ..ReconcileSettings::new("rc1")
    }
}

// =============================================================================
// Plan and execution
// =============================================================================

#[tokio::test]
async fn test_follows_only_unfollowed_leader_indices() {
    let leader = leader(&["idx1", "idx2", "idx3"], &[]);
    let follower = follower_of(&["idx1"]);
    let engine = ReconciliationEngine::new(&leader, &follower, settings());

    let report = engine.run().await.unwrap();

    let planned: Vec<_> = report.plan.to_establish.iter().map(|i| i.as_str()).collect();
    assert_eq!(planned, vec!["idx2", "idx3"]);
    assert_eq!(report.established.len(), 2);
    assert_eq!(report.existing_count, 1);
    assert_eq!(report.leader_count, 3);
    assert!(follower.operations_on("idx1").is_empty());
    for name in ["idx2", "idx3"] {
        let relationship = follower.index(name).unwrap().following.unwrap();
        assert_eq!(relationship.remote_cluster, "rc1");
    }
}

#[tokio::test]
async fn test_closed_and_system_indices_are_not_followed() {
    let leader = leader(&["live", ".kibana"], &["archived"]);
    let follower = InMemoryIndexService::new();
    let engine = ReconciliationEngine::new(&leader, &follower, settings());

    let report = engine.run().await.unwrap();
    let planned: Vec<_> = report.plan.to_establish.iter().map(|i| i.as_str()).collect();
    assert_eq!(planned, vec!["live"]);
}

#[tokio::test]
async fn test_one_failure_does_not_cancel_others() {
    let leader = leader(&["idx1", "idx2", "idx3"], &[]);
    let follower = follower_of(&["idx1"]);
    follower.fail(
        Operation::PutFollow,
        Some("idx3"),
        1,
        ClientError::service("http://follower/idx3/_ccr/follow", 500, "boom"),
    );
    let engine = ReconciliationEngine::new(&leader, &follower, settings());

    let report = engine.run().await.unwrap();

    assert!(report.established.contains("idx2"));
    assert_eq!(report.established.len(), 1);
    assert!(report.failed.contains_key("idx3"));
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.status(), RunStatus::PartialFailure);
}

#[tokio::test]
async fn test_failure_among_five_follows_is_isolated() {
    let all = ["idx1", "idx2", "idx3", "idx4", "idx5"];
    let leader = leader(&all, &[]);
    let follower = InMemoryIndexService::new();
    follower.fail_always(
        Operation::PutFollow,
        Some("idx4"),
        ClientError::request(
            "http://follower/idx4/_ccr/follow",
            "illegal_argument_exception: leader index has soft deletes disabled",
        ),
    );
    let engine = ReconciliationEngine::new(&leader, &follower, settings());

    let report = engine.run().await.unwrap();

    assert_eq!(report.plan.to_establish.len(), 5);
    let established: Vec<_> = report.established.iter().map(|i| i.as_str()).collect();
    assert_eq!(established, vec!["idx1", "idx2", "idx3", "idx5"]);
    assert_eq!(report.failed.len(), 1);
    assert!(report.failed.contains_key("idx4"));
    assert!(follower.index("idx4").is_none());
    for name in ["idx1", "idx2", "idx3", "idx5"] {
        assert!(follower.index(name).unwrap().following.is_some());
    }
    assert_eq!(report.status(), RunStatus::PartialFailure);
}

#[tokio::test]
async fn test_follow_calls_are_never_retried() {
    let leader = leader(&["idx1"], &[]);
    let follower = InMemoryIndexService::new();
    follower.fail(
        Operation::PutFollow,
        None,
        1,
        ClientError::connectivity("http://follower/idx1/_ccr/follow", "reset"),
    );
    let engine = ReconciliationEngine::new(&leader, &follower, settings());

    let report = engine.run().await.unwrap();
    assert_eq!(report.failed.len(), 1);
    assert_eq!(follower.operations_on("idx1"), vec![Operation::PutFollow]);
}

#[tokio::test]
async fn test_width_of_one_still_covers_plan() {
    let names: Vec<String> = (0..25).map(|i| format!("idx{:02}", i)).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let leader = leader(&refs, &[]);
    let follower = InMemoryIndexService::new();
    let engine = ReconciliationEngine::new(
        &leader,
        &follower,
        ReconcileSettings {
            concurrency: 1,
            ..settings()
        },
    );

    let report = engine.run().await.unwrap();
    assert_eq!(report.established.len(), 25);
    assert_eq!(report.status(), RunStatus::Completed);
}

// =============================================================================
// Dry run and fatal inventory
// =============================================================================

#[tokio::test]
async fn test_dry_run_reports_plan_without_mutation() {
    let leader = leader(&["idx1", "idx2"], &[]);
    let follower = InMemoryIndexService::new();
    let engine = ReconciliationEngine::new(
        &leader,
        &follower,
        ReconcileSettings {
            dry_run: true,
            ..settings()
        },
    );

    let report = engine.run().await.unwrap();
    assert!(report.dry_run);
    assert_eq!(report.plan.len(), 2);
    assert!(report.established.is_empty());
    assert!(follower.mutating_calls().is_empty());
    assert!(leader.mutating_calls().is_empty());
}

#[tokio::test]
async fn test_leader_inventory_exhaustion_is_fatal_before_follow() {
    let leader = leader(&["idx1"], &[]);
    leader.fail_always(
        Operation::ListOpenIndices,
        None,
        ClientError::service("http://leader/_cat/indices", 503, "unavailable"),
    );
    let follower = InMemoryIndexService::new();
    let engine = ReconciliationEngine::new(&leader, &follower, settings());

    let err = engine.run().await.unwrap_err();
    assert!(matches!(err, ReconcileError::LeaderInventory { attempts: 3, .. }));
    assert!(follower.calls().is_empty());
}
