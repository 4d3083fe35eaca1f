//! Remote Index Service Client
//!
//! Typed wrapper around the remote replication and index-administration API.
//!
//! - Every call is a single remote request
//! - No caching: every read observes live remote state
//! - No retry: retry policy belongs to the caller
//! - Responses are decoded into typed payloads; a shape mismatch is a
//!   service error, never a panic

mod errors;
mod http;
pub mod memory;
mod service;
mod types;
mod wire;

pub use errors::{ClientError, ClientErrorKind, ClientResult};
pub use http::{ClusterTarget, HttpIndexService};
pub use memory::{InMemoryIndexService, IndexView, Operation, RecordedCall};
pub use service::IndexService;
pub use types::{AliasSnapshot, FollowRelationship, IndexName, ShardCheckpoint};
