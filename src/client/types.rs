//! Replication and index-administration values exchanged with the remote
//! service. All of them are built fresh from remote reads on every run.

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Index identifier, unique within a cluster.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexName(String);

impl IndexName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Dot-prefixed indices are cluster-internal.
    pub fn is_system(&self) -> bool {
        self.0.starts_with('.')
    }
}

impl fmt::Display for IndexName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for IndexName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for IndexName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for IndexName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A follower index replicating a leader index from a remote cluster.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FollowRelationship {
    pub follower_index: IndexName,
    pub leader_index: IndexName,
    pub remote_cluster: String,
}

/// Per-shard global checkpoints of a follower and its leader.
///
/// Read fresh on every validation; checkpoints advance continuously.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardCheckpoint {
    pub shard_id: u32,
    pub leader_global_checkpoint: i64,
    pub follower_global_checkpoint: i64,
}

impl ShardCheckpoint {
    pub fn new(shard_id: u32, leader: i64, follower: i64) -> Self {
        Self {
            shard_id,
            leader_global_checkpoint: leader,
            follower_global_checkpoint: follower,
        }
    }

    pub fn in_parity(&self) -> bool {
        self.leader_global_checkpoint == self.follower_global_checkpoint
    }

    /// Operations the follower has yet to apply on this shard.
    pub fn lag(&self) -> i64 {
        self.leader_global_checkpoint - self.follower_global_checkpoint
    }
}

/// Alias bindings of one index, captured before promotion and reapplied
/// after it. Definitions (filter, routing, write flag) are opaque.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasSnapshot {
    pub index: IndexName,
    pub aliases: BTreeMap<String, Value>,
}

impl AliasSnapshot {
    pub fn new(index: IndexName, aliases: BTreeMap<String, Value>) -> Self {
        Self { index, aliases }
    }

    pub fn names(&self) -> Vec<&str> {
        self.aliases.keys().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_system_index_detection() {
        assert!(IndexName::from(".security-7").is_system());
        assert!(!IndexName::from("logs-2024").is_system());
    }

    #[test]
    fn test_index_name_borrow_lookup() {
        let set: BTreeSet<IndexName> = ["a", "b"].into_iter().map(IndexName::from).collect();
        assert!(set.contains("a"));
        assert!(!set.contains("c"));
    }

    #[test]
    fn test_shard_parity_and_lag() {
        let shard = ShardCheckpoint::new(0, 120, 100);
        assert!(!shard.in_parity());
        assert_eq!(shard.lag(), 20);
        assert!(ShardCheckpoint::new(1, 7, 7).in_parity());
    }

    #[test]
    fn test_index_name_serializes_as_plain_string() {
        let json = serde_json::to_string(&IndexName::from("orders")).unwrap();
        assert_eq!(json, "\"orders\"");
    }
}
