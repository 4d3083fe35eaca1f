//! Reconciliation plan: leader indices that nothing on the follower cluster
//! follows yet.

use std::collections::BTreeSet;

use crate::client::{FollowRelationship, IndexName};

/// Indices to start following, computed once per run.
///
/// Stale as soon as it is computed; following an index that gained a
/// relationship in the meantime fails and is reported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationPlan {
    pub to_establish: BTreeSet<IndexName>,
}

impl ReconciliationPlan {
    /// `leader_open - {r.leader_index | r in existing}`.
    ///
    /// `leader_open` must list open indices only; closed indices cannot be
    /// followed. System indices are never planned.
    pub fn compute<I>(leader_open: I, existing: &[FollowRelationship]) -> Self
    where
        I: IntoIterator<Item = IndexName>,
    {
        let followed: BTreeSet<&IndexName> = existing.iter().map(|r| &r.leader_index).collect();
        let to_establish = leader_open
            .into_iter()
            .filter(|index| !index.is_system() && !followed.contains(index))
            .collect();
        Self { to_establish }
    }

    pub fn is_empty(&self) -> bool {
        self.to_establish.is_empty()
    }

    pub fn len(&self) -> usize {
        self.to_establish.len()
    }
}
