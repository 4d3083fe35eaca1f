//! Remote index-management capability set.
//!
//! One implementation instance is bound to one cluster target. Each method is
//! a single remote call: no caching, no retry. Two calls against the same
//! index may observe different remote states.

use async_trait::async_trait;
use serde_json::Value;

use super::errors::ClientResult;
use super::types::{AliasSnapshot, FollowRelationship, IndexName, ShardCheckpoint};

#[async_trait]
pub trait IndexService: Send + Sync {
    /// Follower indices currently reported by the replication stats endpoint.
    async fn discover_followers(&self) -> ClientResult<Vec<IndexName>>;

    /// Every follow relationship on this (follower) cluster.
    async fn list_follow_relationships(&self) -> ClientResult<Vec<FollowRelationship>>;

    /// Open, non-system indices on this (leader) cluster.
    async fn list_open_indices(&self) -> ClientResult<Vec<IndexName>>;

    /// Shard checkpoints of a follower index, ordered by shard id.
    ///
    /// Fails with `NotFound` if the index is not a follower.
    async fn get_checkpoints(&self, index: &IndexName) -> ClientResult<Vec<ShardCheckpoint>>;

    async fn pause_follow(&self, index: &IndexName) -> ClientResult<()>;

    async fn close_index(&self, index: &IndexName) -> ClientResult<()>;

    /// Severs the follow relationship permanently. The index must be closed.
    async fn unfollow(&self, index: &IndexName) -> ClientResult<()>;

    async fn open_index(&self, index: &IndexName) -> ClientResult<()>;

    async fn get_aliases(&self, index: &IndexName) -> ClientResult<AliasSnapshot>;

    async fn put_alias(&self, index: &IndexName, alias: &str, definition: &Value)
        -> ClientResult<()>;

    /// Sets `index.blocks.write`.
    async fn set_write_block(&self, index: &IndexName, blocked: bool) -> ClientResult<()>;

    /// Starts following `leader_index` from `remote_cluster` under the same
    /// index name on this cluster.
    async fn put_follow(
        &self,
        leader_index: &IndexName,
        remote_cluster: &str,
    ) -> ClientResult<FollowRelationship>;
}
