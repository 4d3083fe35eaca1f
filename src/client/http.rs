//! HTTP implementation of [`IndexService`] against an
//! Elasticsearch-compatible replication API.
//!
//! Request paths are assembled segment by segment so index and alias names
//! are percent-encoded and can never change the shape of the path.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use super::errors::{ClientError, ClientResult};
use super::service::IndexService;
use super::types::{AliasSnapshot, FollowRelationship, IndexName, ShardCheckpoint};
use super::wire::{
    error_reason, open_indices, AckResponse, AliasResponse, CatIndexRow, CcrStatsResponse,
    FollowInfoResponse, FollowResponse, IndexCcrStatsResponse, PutFollowRequest,
};

/// One remote cluster: base URL plus an opaque API key credential.
#[derive(Clone, PartialEq, Eq)]
pub struct ClusterTarget {
    url: String,
    api_key: String,
}

impl ClusterTarget {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let url: String = url.into();
        Self {
            url: url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Base URL extended by `segments`, each percent-encoded on its own.
    fn endpoint(&self, segments: &[&str], query: Option<&str>) -> ClientResult<Url> {
        let mut url = Url::parse(&self.url)
            .map_err(|e| ClientError::request(&self.url, format!("invalid cluster URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|()| ClientError::request(&self.url, "cluster URL cannot carry a path"))?
            .pop_if_empty()
            .extend(segments);
        url.set_query(query);
        Ok(url)
    }

    fn authorization(&self) -> String {
        format!("ApiKey {}", self.api_key)
    }
}

impl fmt::Debug for ClusterTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterTarget")
            .field("url", &self.url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// reqwest-backed index service bound to a single cluster.
pub struct HttpIndexService {
    target: ClusterTarget,
    http: reqwest::Client,
}

impl HttpIndexService {
    /// Build a client whose every call is bounded by `timeout`.
    pub fn new(target: ClusterTarget, timeout: Duration) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::connectivity(target.url(), e.to_string()))?;
        Ok(Self { target, http })
    }

    fn url(&self, segments: &[&str]) -> ClientResult<Url> {
        self.target.endpoint(segments, None)
    }

    /// Issue one request and return the body of a 2xx response.
    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> ClientResult<String> {
        let path = url.path().to_string();
        let mut request = self
            .http
            .request(method, url)
            .header(AUTHORIZATION, self.target.authorization())
            .header(CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ClientError::connectivity(&path, e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ClientError::connectivity(&path, e.to_string()))?;

        if status.is_success() {
            Ok(text)
        } else {
            Err(ClientError::from_status(path, status.as_u16(), error_reason(&text)))
        }
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> ClientResult<T> {
        let path = url.path().to_string();
        let text = self.send::<Value>(Method::GET, url, None).await?;
        decode(&path, &text)
    }

    /// Mutating call whose body is an acknowledgement.
    async fn acked<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> ClientResult<()> {
        let path = url.path().to_string();
        let text = self.send(method, url, body).await?;
        let ack: AckResponse = if text.trim().is_empty() {
            AckResponse::default()
        } else {
            decode(&path, &text)?
        };
        if ack.is_acknowledged() {
            Ok(())
        } else {
            Err(ClientError::service(path, 200, "request was not acknowledged"))
        }
    }
}

fn decode<T: DeserializeOwned>(path: &str, text: &str) -> ClientResult<T> {
    serde_json::from_str(text).map_err(|e| ClientError::schema_mismatch(path, e))
}

#[async_trait]
impl IndexService for HttpIndexService {
    async fn discover_followers(&self) -> ClientResult<Vec<IndexName>> {
        let stats: CcrStatsResponse = self.get(self.url(&["_ccr", "stats"])?).await?;
        Ok(stats.follower_indices())
    }

    async fn list_follow_relationships(&self) -> ClientResult<Vec<FollowRelationship>> {
        let info: FollowInfoResponse = self.get(self.url(&["_all", "_ccr", "info"])?).await?;
        Ok(info.follower_indices)
    }

    async fn list_open_indices(&self) -> ClientResult<Vec<IndexName>> {
        let url = self.target.endpoint(
            &["_cat", "indices", "*,-.*"],
            Some("format=json&s=index&h=index,status"),
        )?;
        let rows: Vec<CatIndexRow> = self.get(url).await?;
        Ok(open_indices(rows))
    }

    async fn get_checkpoints(&self, index: &IndexName) -> ClientResult<Vec<ShardCheckpoint>> {
        let url = self.url(&[index.as_str(), "_ccr", "stats"])?;
        let path = url.path().to_string();
        let stats: IndexCcrStatsResponse = self.get(url).await?;
        stats
            .checkpoints_for(index)
            .ok_or_else(|| ClientError::not_found(path, format!("{} is not a follower index", index)))
    }

    async fn pause_follow(&self, index: &IndexName) -> ClientResult<()> {
        let url = self.url(&[index.as_str(), "_ccr", "pause_follow"])?;
        self.acked::<Value>(Method::POST, url, None).await
    }

    async fn close_index(&self, index: &IndexName) -> ClientResult<()> {
        let url = self.url(&[index.as_str(), "_close"])?;
        self.acked::<Value>(Method::POST, url, None).await
    }

    async fn unfollow(&self, index: &IndexName) -> ClientResult<()> {
        let url = self.url(&[index.as_str(), "_ccr", "unfollow"])?;
        self.acked::<Value>(Method::POST, url, None).await
    }

    async fn open_index(&self, index: &IndexName) -> ClientResult<()> {
        let url = self.url(&[index.as_str(), "_open"])?;
        self.acked::<Value>(Method::POST, url, None).await
    }

    async fn get_aliases(&self, index: &IndexName) -> ClientResult<AliasSnapshot> {
        let url = self.url(&[index.as_str(), "_alias"])?;
        let path = url.path().to_string();
        let mut resp: AliasResponse = self.get(url).await?;
        let entry = resp.remove(index.as_str()).ok_or_else(|| {
            ClientError::schema_mismatch(&path, format!("no alias entry for {}", index))
        })?;
        Ok(AliasSnapshot::new(index.clone(), entry.aliases))
    }

    async fn put_alias(
        &self,
        index: &IndexName,
        alias: &str,
        definition: &Value,
    ) -> ClientResult<()> {
        let url = self.url(&[index.as_str(), "_alias", alias])?;
        self.acked(Method::PUT, url, Some(definition)).await
    }

    async fn set_write_block(&self, index: &IndexName, blocked: bool) -> ClientResult<()> {
        let url = self.url(&[index.as_str(), "_settings"])?;
        let body = json!({ "index.blocks.write": blocked });
        self.acked(Method::PUT, url, Some(&body)).await
    }

    /// The follower index is named after the leader index.
    async fn put_follow(
        &self,
        leader_index: &IndexName,
        remote_cluster: &str,
    ) -> ClientResult<FollowRelationship> {
        let url = self.url(&[leader_index.as_str(), "_ccr", "follow"])?;
        let path = url.path().to_string();
        let body = PutFollowRequest {
            remote_cluster,
            leader_index: leader_index.as_str(),
        };
        let text = self.send(Method::PUT, url, Some(&body)).await?;
        let resp: FollowResponse = if text.trim().is_empty() {
            FollowResponse::default()
        } else {
            decode(&path, &text)?
        };
        if !resp.is_following() {
            return Err(ClientError::service(
                path,
                200,
                format!(
                    "follow not started (follow_index_created={:?}, index_following_started={:?})",
                    resp.follow_index_created, resp.index_following_started
                ),
            ));
        }
        Ok(FollowRelationship {
            follower_index: leader_index.clone(),
            leader_index: leader_index.clone(),
            remote_cluster: remote_cluster.to_string(),
        })
    }
}
