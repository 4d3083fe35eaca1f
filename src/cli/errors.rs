//! CLI-specific error types
//!
//! Every CLI error ends the run with exit status 1.

use std::fmt;
use std::io;

use crate::client::ClientError;
use crate::reconcile::ReconcileError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file missing, malformed or invalid
    ConfigError,
    /// A remote cluster could not be reached or refused a fatal call
    RemoteError,
    /// Local I/O failure
    IoError,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "CCR_CLI_CONFIG_ERROR",
            Self::RemoteError => "CCR_CLI_REMOTE_ERROR",
            Self::IoError => "CCR_CLI_IO_ERROR",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn remote_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::RemoteError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<ClientError> for CliError {
    fn from(e: ClientError) -> Self {
        Self::remote_error(e.to_string())
    }
}

impl From<ReconcileError> for CliError {
    fn from(e: ReconcileError) -> Self {
        Self::remote_error(e.to_string())
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_leads_with_code() {
        let err = CliError::config_error("rc_name is required");
        assert_eq!(err.to_string(), "CCR_CLI_CONFIG_ERROR: rc_name is required");
    }

    #[test]
    fn test_client_error_maps_to_remote() {
        let err: CliError = ClientError::connectivity("http://x/_ccr/stats", "refused").into();
        assert_eq!(err.code(), &CliErrorCode::RemoteError);
        assert!(err.message().contains("refused"));
    }
}
