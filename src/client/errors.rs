//! Remote Index Service Error Types
//!
//! Every call against the remote index-management API fails with exactly one
//! of these kinds. The client performs no retry; callers decide what is
//! retryable.

use std::fmt;

use thiserror::Error;

/// Error kinds surfaced by the remote boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientErrorKind {
    /// Transport-level failure (connect, timeout, TLS).
    Connectivity,
    /// Remote rejected or failed the call with a non-2xx status, or the
    /// response did not decode into the expected shape.
    Service,
    /// Target index or relationship is absent.
    NotFound,
    /// Malformed or rejected request.
    Request,
}

impl ClientErrorKind {
    /// Stable name used in log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connectivity => "connectivity",
            Self::Service => "service",
            Self::NotFound => "not_found",
            Self::Request => "request",
        }
    }
}

impl fmt::Display for ClientErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Remote index service error.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    #[error("connectivity error calling {endpoint}: {message}")]
    Connectivity { endpoint: String, message: String },

    #[error("service error from {endpoint} (status {status}): {reason}")]
    Service {
        endpoint: String,
        status: u16,
        reason: String,
    },

    #[error("not found at {endpoint}: {reason}")]
    NotFound { endpoint: String, reason: String },

    #[error("request rejected by {endpoint}: {reason}")]
    Request { endpoint: String, reason: String },
}

impl ClientError {
    pub fn connectivity(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connectivity {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    pub fn service(endpoint: impl Into<String>, status: u16, reason: impl Into<String>) -> Self {
        Self::Service {
            endpoint: endpoint.into(),
            status,
            reason: reason.into(),
        }
    }

    /// Response body did not match the typed response for this endpoint.
    pub fn schema_mismatch(endpoint: impl Into<String>, detail: impl fmt::Display) -> Self {
        Self::service(endpoint, 200, format!("unexpected response shape: {}", detail))
    }

    pub fn not_found(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::NotFound {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    pub fn request(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Request {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    /// Map a non-2xx HTTP status to its error kind.
    pub fn from_status(endpoint: impl Into<String>, status: u16, reason: impl Into<String>) -> Self {
        match status {
            404 => Self::not_found(endpoint, reason),
            400 => Self::request(endpoint, reason),
            _ => Self::service(endpoint, status, reason),
        }
    }

    pub fn kind(&self) -> ClientErrorKind {
        match self {
            Self::Connectivity { .. } => ClientErrorKind::Connectivity,
            Self::Service { .. } => ClientErrorKind::Service,
            Self::NotFound { .. } => ClientErrorKind::NotFound,
            Self::Request { .. } => ClientErrorKind::Request,
        }
    }

    /// Whether a promotion attempt may be re-run after this error.
    ///
    /// A missing index will not appear between attempts.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::NotFound { .. })
    }

    /// The remote refused to pause because the follower has no running
    /// shard-follow tasks, i.e. it is already paused.
    pub fn is_already_paused(&self) -> bool {
        match self {
            Self::Request { reason, .. } | Self::Service { reason, .. } => {
                reason.contains("no shard follow tasks")
            }
            _ => false,
        }
    }
}

/// Result type for remote index service calls
pub type ClientResult<T> = Result<T, ClientError>;
