//! In-process model of one cluster's replication and index-administration
//! surface.
//!
//! Mirrors the remote behaviors the promotion sequence relies on:
//! - unfollow requires a closed, paused follower
//! - unfollow drops the index's alias bindings and leaves it write-blocked
//! - pausing an already-paused follower is rejected with
//!   "no shard follow tasks"
//! - putFollow on an existing index is rejected
//!
//! Faults can be injected per operation (and optionally per index); every
//! call is recorded so tests can assert on what was, or was not, sent.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use super::errors::{ClientError, ClientResult};
use super::service::IndexService;
use super::types::{AliasSnapshot, FollowRelationship, IndexName, ShardCheckpoint};

/// Remote operations, as recorded in the call log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    DiscoverFollowers,
    ListFollowRelationships,
    ListOpenIndices,
    GetCheckpoints,
    PauseFollow,
    CloseIndex,
    Unfollow,
    OpenIndex,
    GetAliases,
    PutAlias,
    SetWriteBlock,
    PutFollow,
}

impl Operation {
    /// Whether the operation changes remote cluster state.
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            Self::PauseFollow
                | Self::CloseIndex
                | Self::Unfollow
                | Self::OpenIndex
                | Self::PutAlias
                | Self::SetWriteBlock
                | Self::PutFollow
        )
    }
}

/// One recorded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub operation: Operation,
    pub index: Option<IndexName>,
}

/// Observable state of one modelled index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexView {
    pub open: bool,
    pub following: Option<FollowRelationship>,
    pub paused: bool,
    pub write_blocked: bool,
    pub aliases: BTreeMap<String, Value>,
}

#[derive(Debug, Clone)]
struct IndexModel {
    open: bool,
    following: Option<FollowRelationship>,
    paused: bool,
    write_blocked: bool,
    aliases: BTreeMap<String, Value>,
    checkpoints: Vec<ShardCheckpoint>,
}

impl IndexModel {
    fn plain(open: bool) -> Self {
        Self {
            open,
            following: None,
            paused: false,
            write_blocked: false,
            aliases: BTreeMap::new(),
            checkpoints: Vec::new(),
        }
    }

    fn view(&self) -> IndexView {
        IndexView {
            open: self.open,
            following: self.following.clone(),
            paused: self.paused,
            write_blocked: self.write_blocked,
            aliases: self.aliases.clone(),
        }
    }
}

#[derive(Debug)]
struct Fault {
    operation: Operation,
    index: Option<IndexName>,
    remaining: usize,
    error: ClientError,
}

#[derive(Debug, Default)]
struct ClusterModel {
    indices: BTreeMap<IndexName, IndexModel>,
    faults: Vec<Fault>,
    calls: Vec<RecordedCall>,
}

impl ClusterModel {
    /// Record the call, then fire the first matching armed fault.
    fn enter(&mut self, operation: Operation, index: Option<&IndexName>) -> ClientResult<()> {
        self.calls.push(RecordedCall {
            operation,
            index: index.cloned(),
        });
        let fault = self.faults.iter_mut().find(|f| {
            f.operation == operation
                && f.remaining > 0
                && (f.index.is_none() || f.index.as_ref() == index)
        });
        match fault {
            Some(fault) => {
                fault.remaining -= 1;
                Err(fault.error.clone())
            }
            None => Ok(()),
        }
    }

    fn index_mut(&mut self, endpoint: &str, index: &IndexName) -> ClientResult<&mut IndexModel> {
        self.indices.get_mut(index).ok_or_else(|| {
            ClientError::not_found(
                endpoint,
                format!("index_not_found_exception: no such index [{}]", index),
            )
        })
    }
}

/// Cluster model implementing [`IndexService`] in process.
#[derive(Debug, Default)]
pub struct InMemoryIndexService {
    model: Mutex<ClusterModel>,
}

impl InMemoryIndexService {
    pub fn new() -> Self {
        Self::default()
    }

    fn model(&self) -> MutexGuard<'_, ClusterModel> {
        self.model.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a plain index (leader-side inventory).
    pub fn with_index(self, name: &str, open: bool) -> Self {
        self.model()
            .indices
            .insert(IndexName::from(name), IndexModel::plain(open));
        self
    }

    /// Add an open, actively replicating, write-blocked follower index.
    pub fn with_follower(
        self,
        name: &str,
        leader: &str,
        remote_cluster: &str,
        checkpoints: Vec<ShardCheckpoint>,
    ) -> Self {
        let index = IndexName::from(name);
        let mut model = IndexModel::plain(true);
        model.following = Some(FollowRelationship {
            follower_index: index.clone(),
            leader_index: IndexName::from(leader),
            remote_cluster: remote_cluster.to_string(),
        });
        model.write_blocked = true;
        model.checkpoints = checkpoints;
        self.model().indices.insert(index, model);
        self
    }

    /// Bind an alias on an existing index.
    pub fn with_alias(self, index: &str, alias: &str, definition: Value) -> Self {
        if let Some(model) = self.model().indices.get_mut(index) {
            model.aliases.insert(alias.to_string(), definition);
        }
        self
    }

    /// Fail the next `times` calls of `operation` (on `index`, or on any
    /// index when `None`) with `error`.
    pub fn fail(
        &self,
        operation: Operation,
        index: Option<&str>,
        times: usize,
        error: ClientError,
    ) {
        self.model().faults.push(Fault {
            operation,
            index: index.map(IndexName::from),
            remaining: times,
            error,
        });
    }

    /// Fail every call of `operation` on `index`.
    pub fn fail_always(&self, operation: Operation, index: Option<&str>, error: ClientError) {
        self.fail(operation, index, usize::MAX, error);
    }

    /// Replace the checkpoints of a follower index.
    pub fn set_checkpoints(&self, index: &str, checkpoints: Vec<ShardCheckpoint>) {
        if let Some(model) = self.model().indices.get_mut(index) {
            model.checkpoints = checkpoints;
        }
    }

    pub fn index(&self, name: &str) -> Option<IndexView> {
        self.model().indices.get(name).map(IndexModel::view)
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.model().calls.clone()
    }

    pub fn mutating_calls(&self) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.operation.is_mutating())
            .collect()
    }

    /// Operations issued against one index, in order.
    pub fn operations_on(&self, index: &str) -> Vec<Operation> {
        self.model()
            .calls
            .iter()
            .filter(|c| c.index.as_ref().map(IndexName::as_str) == Some(index))
            .map(|c| c.operation)
            .collect()
    }
}

#[async_trait]
impl IndexService for InMemoryIndexService {
    async fn discover_followers(&self) -> ClientResult<Vec<IndexName>> {
        let mut model = self.model();
        model.enter(Operation::DiscoverFollowers, None)?;
        Ok(model
            .indices
            .iter()
            .filter(|(_, m)| m.following.is_some() && !m.paused)
            .map(|(name, _)| name.clone())
            .collect())
    }

    async fn list_follow_relationships(&self) -> ClientResult<Vec<FollowRelationship>> {
        let mut model = self.model();
        model.enter(Operation::ListFollowRelationships, None)?;
        Ok(model
            .indices
            .values()
            .filter_map(|m| m.following.clone())
            .collect())
    }

    async fn list_open_indices(&self) -> ClientResult<Vec<IndexName>> {
        let mut model = self.model();
        model.enter(Operation::ListOpenIndices, None)?;
        Ok(model
            .indices
            .iter()
            .filter(|(name, m)| m.open && !name.is_system())
            .map(|(name, _)| name.clone())
            .collect())
    }

    async fn get_checkpoints(&self, index: &IndexName) -> ClientResult<Vec<ShardCheckpoint>> {
        let endpoint = format!("/{}/_ccr/stats", index);
        let mut model = self.model();
        model.enter(Operation::GetCheckpoints, Some(index))?;
        let entry = model.index_mut(&endpoint, index)?;
        if entry.following.is_none() {
            return Err(ClientError::not_found(
                endpoint,
                format!("{} is not a follower index", index),
            ));
        }
        let mut shards = entry.checkpoints.clone();
        shards.sort_by_key(|s| s.shard_id);
        Ok(shards)
    }

    async fn pause_follow(&self, index: &IndexName) -> ClientResult<()> {
        let endpoint = format!("/{}/_ccr/pause_follow", index);
        let mut model = self.model();
        model.enter(Operation::PauseFollow, Some(index))?;
        let entry = model.index_mut(&endpoint, index)?;
        if entry.following.is_none() {
            return Err(ClientError::request(
                endpoint,
                format!("illegal_argument_exception: index [{}] is not a follower index", index),
            ));
        }
        if entry.paused {
            return Err(ClientError::request(
                endpoint,
                format!("illegal_argument_exception: no shard follow tasks for [{}]", index),
            ));
        }
        entry.paused = true;
        Ok(())
    }

    async fn close_index(&self, index: &IndexName) -> ClientResult<()> {
        let endpoint = format!("/{}/_close", index);
        let mut model = self.model();
        model.enter(Operation::CloseIndex, Some(index))?;
        model.index_mut(&endpoint, index)?.open = false;
        Ok(())
    }

    async fn unfollow(&self, index: &IndexName) -> ClientResult<()> {
        let endpoint = format!("/{}/_ccr/unfollow", index);
        let mut model = self.model();
        model.enter(Operation::Unfollow, Some(index))?;
        let entry = model.index_mut(&endpoint, index)?;
        if entry.following.is_none() {
            return Err(ClientError::request(
                endpoint,
                format!("illegal_argument_exception: index [{}] is not a follower index", index),
            ));
        }
        if entry.open || !entry.paused {
            return Err(ClientError::request(
                endpoint,
                format!(
                    "illegal_argument_exception: cannot convert the follower index [{}] to a \
                     non-follower, because it has not been paused and closed",
                    index
                ),
            ));
        }
        entry.following = None;
        entry.paused = false;
        entry.write_blocked = true;
        entry.aliases.clear();
        Ok(())
    }

    async fn open_index(&self, index: &IndexName) -> ClientResult<()> {
        let endpoint = format!("/{}/_open", index);
        let mut model = self.model();
        model.enter(Operation::OpenIndex, Some(index))?;
        model.index_mut(&endpoint, index)?.open = true;
        Ok(())
    }

    async fn get_aliases(&self, index: &IndexName) -> ClientResult<AliasSnapshot> {
        let endpoint = format!("/{}/_alias", index);
        let mut model = self.model();
        model.enter(Operation::GetAliases, Some(index))?;
        let aliases = model.index_mut(&endpoint, index)?.aliases.clone();
        Ok(AliasSnapshot::new(index.clone(), aliases))
    }

    async fn put_alias(
        &self,
        index: &IndexName,
        alias: &str,
        definition: &Value,
    ) -> ClientResult<()> {
        let endpoint = format!("/{}/_alias/{}", index, alias);
        let mut model = self.model();
        model.enter(Operation::PutAlias, Some(index))?;
        model
            .index_mut(&endpoint, index)?
            .aliases
            .insert(alias.to_string(), definition.clone());
        Ok(())
    }

    async fn set_write_block(&self, index: &IndexName, blocked: bool) -> ClientResult<()> {
        let endpoint = format!("/{}/_settings", index);
        let mut model = self.model();
        model.enter(Operation::SetWriteBlock, Some(index))?;
        model.index_mut(&endpoint, index)?.write_blocked = blocked;
        Ok(())
    }

    async fn put_follow(
        &self,
        leader_index: &IndexName,
        remote_cluster: &str,
    ) -> ClientResult<FollowRelationship> {
        let endpoint = format!("/{}/_ccr/follow", leader_index);
        let mut model = self.model();
        model.enter(Operation::PutFollow, Some(leader_index))?;
        if model.indices.contains_key(leader_index) {
            return Err(ClientError::request(
                endpoint,
                format!(
                    "resource_already_exists_exception: index [{}] already exists",
                    leader_index
                ),
            ));
        }
        let relationship = FollowRelationship {
            follower_index: leader_index.clone(),
            leader_index: leader_index.clone(),
            remote_cluster: remote_cluster.to_string(),
        };
        let mut entry = IndexModel::plain(true);
        entry.following = Some(relationship.clone());
        entry.write_blocked = true;
        model.indices.insert(leader_index.clone(), entry);
        Ok(relationship)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn idx(name: &str) -> IndexName {
        IndexName::from(name)
    }

    #[tokio::test]
    async fn test_unfollow_requires_paused_and_closed() {
        let svc = InMemoryIndexService::new().with_follower("logs", "logs", "rc1", vec![]);

        let err = svc.unfollow(&idx("logs")).await.unwrap_err();
        assert!(err.to_string().contains("not been paused and closed"));

        svc.pause_follow(&idx("logs")).await.unwrap();
        svc.close_index(&idx("logs")).await.unwrap();
        svc.unfollow(&idx("logs")).await.unwrap();

        let view = svc.index("logs").unwrap();
        assert!(view.following.is_none());
        assert!(!view.open);
    }

    #[tokio::test]
    async fn test_unfollow_drops_aliases() {
        let svc = InMemoryIndexService::new()
            .with_follower("logs", "logs", "rc1", vec![])
            .with_alias("logs", "logs-read", json!({}));

        svc.pause_follow(&idx("logs")).await.unwrap();
        svc.close_index(&idx("logs")).await.unwrap();
        svc.unfollow(&idx("logs")).await.unwrap();

        assert!(svc.index("logs").unwrap().aliases.is_empty());
    }

    #[tokio::test]
    async fn test_second_pause_reports_no_follow_tasks() {
        let svc = InMemoryIndexService::new().with_follower("logs", "logs", "rc1", vec![]);
        svc.pause_follow(&idx("logs")).await.unwrap();
        let err = svc.pause_follow(&idx("logs")).await.unwrap_err();
        assert!(err.is_already_paused());
    }

    #[tokio::test]
    async fn test_fault_fires_limited_times_for_matching_index() {
        let svc = InMemoryIndexService::new()
            .with_index("a", true)
            .with_index("b", true);
        svc.fail(
            Operation::CloseIndex,
            Some("a"),
            1,
            ClientError::connectivity("/a/_close", "reset"),
        );

        assert!(svc.close_index(&idx("b")).await.is_ok());
        assert!(svc.close_index(&idx("a")).await.is_err());
        assert!(svc.close_index(&idx("a")).await.is_ok());
        assert_eq!(svc.mutating_calls().len(), 3);
    }

    #[tokio::test]
    async fn test_put_follow_rejects_existing_index() {
        let svc = InMemoryIndexService::new().with_index("idx1", true);
        let err = svc.put_follow(&idx("idx1"), "rc1").await.unwrap_err();
        assert!(err.to_string().contains("already exists"));

        let rel = svc.put_follow(&idx("idx2"), "rc1").await.unwrap();
        assert_eq!(rel.leader_index, idx("idx2"));
        assert_eq!(svc.list_follow_relationships().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_open_indices_exclude_closed_and_system() {
        let svc = InMemoryIndexService::new()
            .with_index(".tasks", true)
            .with_index("a", true)
            .with_index("b", false);
        assert_eq!(svc.list_open_indices().await.unwrap(), vec![idx("a")]);
    }
}
