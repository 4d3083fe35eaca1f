//! Typed response payloads for the remote API.
//!
//! Only the fields this tool depends on are declared; everything else in a
//! response is ignored. A payload that lacks a declared field is a schema
//! mismatch and surfaces as a service error at the call site.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::types::{FollowRelationship, IndexName, ShardCheckpoint};

/// `GET /_ccr/stats`
#[derive(Debug, Deserialize)]
pub struct CcrStatsResponse {
    #[serde(default)]
    pub follow_stats: FollowStats,
}

#[derive(Debug, Default, Deserialize)]
pub struct FollowStats {
    #[serde(default)]
    pub indices: Vec<FollowIndexEntry>,
}

#[derive(Debug, Deserialize)]
pub struct FollowIndexEntry {
    #[serde(default)]
    pub shards: Vec<FollowShardEntry>,
}

#[derive(Debug, Deserialize)]
pub struct FollowShardEntry {
    #[serde(default)]
    pub follower_index: Option<String>,
}

impl CcrStatsResponse {
    /// Follower index names in order of first appearance, deduplicated.
    pub fn follower_indices(self) -> Vec<IndexName> {
        let mut seen = Vec::<IndexName>::new();
        for entry in self.follow_stats.indices {
            for shard in entry.shards {
                let Some(name) = shard.follower_index else {
                    continue;
                };
                if name.is_empty() || seen.iter().any(|s| s.as_str() == name) {
                    continue;
                }
                seen.push(IndexName::new(name));
            }
        }
        seen
    }
}

/// `GET /{index}/_ccr/stats`
#[derive(Debug, Deserialize)]
pub struct IndexCcrStatsResponse {
    pub indices: Vec<IndexCcrStatsEntry>,
}

#[derive(Debug, Deserialize)]
pub struct IndexCcrStatsEntry {
    pub index: String,
    #[serde(default)]
    pub shards: Vec<ShardCheckpoint>,
}

impl IndexCcrStatsResponse {
    /// Checkpoints of `index`, ordered by shard id. `None` if the response
    /// does not mention the index at all.
    pub fn checkpoints_for(self, index: &IndexName) -> Option<Vec<ShardCheckpoint>> {
        let entry = self
            .indices
            .into_iter()
            .find(|e| e.index == index.as_str())?;
        let mut shards = entry.shards;
        shards.sort_by_key(|s| s.shard_id);
        Some(shards)
    }
}

/// `GET /_all/_ccr/info`
#[derive(Debug, Deserialize)]
pub struct FollowInfoResponse {
    #[serde(default)]
    pub follower_indices: Vec<FollowRelationship>,
}

/// One row of `GET /_cat/indices?format=json`
#[derive(Debug, Deserialize)]
pub struct CatIndexRow {
    pub index: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// Open, non-system indices of a `_cat/indices` listing.
pub fn open_indices(rows: Vec<CatIndexRow>) -> Vec<IndexName> {
    rows.into_iter()
        .filter(|r| r.status.as_deref() == Some("open"))
        .map(|r| IndexName::new(r.index))
        .filter(|i| !i.is_system())
        .collect()
}

/// `GET /{index}/_alias`, keyed by concrete index name.
pub type AliasResponse = HashMap<String, IndexAliases>;

#[derive(Debug, Deserialize)]
pub struct IndexAliases {
    #[serde(default)]
    pub aliases: BTreeMap<String, Value>,
}

/// Acknowledgement body returned by mutating admin calls.
#[derive(Debug, Default, Deserialize)]
pub struct AckResponse {
    #[serde(default)]
    pub acknowledged: Option<bool>,
}

impl AckResponse {
    /// Bodies without an `acknowledged` field count as acknowledged.
    pub fn is_acknowledged(&self) -> bool {
        self.acknowledged.unwrap_or(true)
    }
}

/// `PUT /{index}/_ccr/follow` body.
#[derive(Debug, Serialize)]
pub struct PutFollowRequest<'a> {
    pub remote_cluster: &'a str,
    pub leader_index: &'a str,
}

/// `PUT /{index}/_ccr/follow` response. Absent flags count as set.
#[derive(Debug, Default, Deserialize)]
pub struct FollowResponse {
    #[serde(default)]
    pub follow_index_created: Option<bool>,
    #[serde(default)]
    pub index_following_started: Option<bool>,
}

impl FollowResponse {
    pub fn is_following(&self) -> bool {
        self.follow_index_created.unwrap_or(true) && self.index_following_started.unwrap_or(true)
    }
}

/// Remote error envelope: `{"error": {"type": .., "reason": ..}, "status": ..}`.
#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ErrorBody {
    Detailed {
        #[serde(rename = "type", default)]
        kind: Option<String>,
        #[serde(default)]
        reason: Option<String>,
    },
    Plain(String),
}

/// Best-effort human-readable reason from an error response body.
pub fn error_reason(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(ErrorEnvelope {
            error: ErrorBody::Detailed { kind, reason },
        }) => match (kind, reason) {
            (Some(kind), Some(reason)) => format!("{}: {}", kind, reason),
            (None, Some(reason)) => reason,
            (Some(kind), None) => kind,
            (None, None) => body.to_string(),
        },
        Ok(ErrorEnvelope {
            error: ErrorBody::Plain(reason),
        }) => reason,
        Err(_) => body.to_string(),
    }
}
