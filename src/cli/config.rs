//! Configuration file
//!
//! One JSON document describing both clusters, the remote-cluster alias and
//! the retry budgets. Loaded and validated once, then passed by reference.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::client::ClusterTarget;
use crate::cutover::CutoverSettings;
use crate::promotion::{Backoff, RetryPolicy};
use crate::reconcile::{ReconcileSettings, DEFAULT_CONCURRENCY};

use super::errors::{CliError, CliResult};

/// Endpoint and credential of one cluster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    pub elastic_url: String,
    pub elastic_api_key: String,
}

impl ClusterConfig {
    fn validate(&self, role: &str) -> CliResult<()> {
        let url = self.elastic_url.trim();
        let rest = url
            .strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"));
        match rest {
            Some(host) if !host.trim_end_matches('/').is_empty() => {}
            _ => {
                return Err(CliError::config_error(format!(
                    "{}.elastic_url must be an http(s) URL, got '{}'",
                    role, self.elastic_url
                )))
            }
        }
        if self.elastic_api_key.trim().is_empty() {
            return Err(CliError::config_error(format!(
                "{}.elastic_api_key must not be empty",
                role
            )));
        }
        Ok(())
    }

    pub fn target(&self) -> ClusterTarget {
        ClusterTarget::new(self.elastic_url.trim(), self.elastic_api_key.trim())
    }
}

/// Promotion retry budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromotionRetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_promotion_delay")]
    pub delay_secs: u64,
}

impl Default for PromotionRetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay_secs: default_promotion_delay(),
        }
    }
}

/// Leader inventory retry budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryRetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_inventory_base_delay")]
    pub base_delay_secs: u64,
}

impl Default for InventoryRetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_secs: default_inventory_base_delay(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Required for bootstrap only.
    #[serde(default)]
    pub leader: Option<ClusterConfig>,

    pub follower: ClusterConfig,

    /// Remote-cluster alias of the leader, as registered on the follower.
    /// Required for bootstrap only.
    #[serde(default)]
    pub rc_name: Option<String>,

    #[serde(default)]
    pub dry_run: bool,

    #[serde(default)]
    pub assume_yes: bool,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_concurrency")]
    pub bootstrap_concurrency: usize,

    #[serde(default)]
    pub promotion_retry: PromotionRetryConfig,

    #[serde(default)]
    pub inventory_retry: InventoryRetryConfig,
}

fn default_max_attempts() -> u32 {
    3
}
fn default_promotion_delay() -> u64 {
    5
}
fn default_inventory_base_delay() -> u64 {
    1
}
fn default_request_timeout() -> u64 {
    30
}
fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        Self::parse(&content)
    }

    /// Parse and validate a configuration document.
    pub fn parse(content: &str) -> CliResult<Self> {
        let config: Config = serde_json::from_str(content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        self.follower.validate("follower")?;
        if let Some(leader) = &self.leader {
            leader.validate("leader")?;
        }

        if self.request_timeout_secs == 0 {
            return Err(CliError::config_error("request_timeout_secs must be > 0"));
        }
        if self.bootstrap_concurrency == 0 {
            return Err(CliError::config_error("bootstrap_concurrency must be > 0"));
        }
        if self.promotion_retry.max_attempts == 0 {
            return Err(CliError::config_error(
                "promotion_retry.max_attempts must be > 0",
            ));
        }
        if self.inventory_retry.max_attempts == 0 {
            return Err(CliError::config_error(
                "inventory_retry.max_attempts must be > 0",
            ));
        }
        if let Some(rc) = &self.rc_name {
            if rc.trim().is_empty() {
                return Err(CliError::config_error("rc_name must not be empty"));
            }
        }

        Ok(())
    }

    /// Bootstrap needs both clusters and the remote-cluster alias.
    pub fn require_bootstrap(&self) -> CliResult<(&ClusterConfig, &str)> {
        let leader = self
            .leader
            .as_ref()
            .ok_or_else(|| CliError::config_error("bootstrap requires a 'leader' cluster"))?;
        let rc_name = self
            .rc_name
            .as_deref()
            .ok_or_else(|| CliError::config_error("bootstrap requires 'rc_name'"))?;
        Ok((leader, rc_name))
    }

    /// Command-line flags only ever switch the behavior on.
    pub fn with_overrides(mut self, dry_run: bool, assume_yes: bool) -> Self {
        self.dry_run |= dry_run;
        self.assume_yes |= assume_yes;
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn promotion_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.promotion_retry.max_attempts,
            Backoff::Fixed(Duration::from_secs(self.promotion_retry.delay_secs)),
        )
    }

    pub fn inventory_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.inventory_retry.max_attempts,
            Backoff::Exponential {
                base: Duration::from_secs(self.inventory_retry.base_delay_secs),
            },
        )
    }

    pub fn cutover_settings(&self) -> CutoverSettings {
        CutoverSettings {
            dry_run: self.dry_run,
            assume_yes: self.assume_yes,
            promotion_retry: self.promotion_policy(),
        }
    }

    pub fn reconcile_settings(&self, rc_name: &str) -> ReconcileSettings {
        ReconcileSettings {
            remote_cluster: rc_name.to_string(),
            concurrency: self.bootstrap_concurrency,
            dry_run: self.dry_run,
            inventory_retry: self.inventory_policy(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal() -> serde_json::Value {
        json!({
            "follower": {"elastic_url": "https://follower:9200/", "elastic_api_key": "k"}
        })
    }

    #[test]
    fn test_defaults() {
        let config = Config::parse(&minimal().to_string()).unwrap();
        assert!(!config.dry_run);
        assert!(!config.assume_yes);
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.bootstrap_concurrency, 10);
        assert_eq!(config.promotion_policy(), RetryPolicy::promotion_default());
        assert_eq!(config.inventory_policy(), RetryPolicy::inventory_default());
        assert_eq!(config.follower.target().url(), "https://follower:9200");
    }

    #[test]
    fn test_rejects_non_http_url() {
        let mut doc = minimal();
        doc["follower"]["elastic_url"] = json!("follower:9200");
        let err = Config::parse(&doc.to_string()).unwrap_err();
        assert_eq!(err.code_str(), "CCR_CLI_CONFIG_ERROR");
        assert!(err.message().contains("follower.elastic_url"));
    }

    #[test]
    fn test_rejects_bare_scheme() {
        let mut doc = minimal();
        doc["follower"]["elastic_url"] = json!("http://");
        assert!(Config::parse(&doc.to_string()).is_err());
    }

    #[test]
    fn test_rejects_zero_budgets() {
        let mut doc = minimal();
        doc["promotion_retry"] = json!({"max_attempts": 0});
        assert!(Config::parse(&doc.to_string()).is_err());

        let mut doc = minimal();
        doc["bootstrap_concurrency"] = json!(0);
        assert!(Config::parse(&doc.to_string()).is_err());
    }

    #[test]
    fn test_bootstrap_requirements() {
        let config = Config::parse(&minimal().to_string()).unwrap();
        assert!(config.require_bootstrap().is_err());

        let mut doc = minimal();
        doc["leader"] = json!({"elastic_url": "http://leader:9200", "elastic_api_key": "l"});
        doc["rc_name"] = json!("leader-cluster");
        let config = Config::parse(&doc.to_string()).unwrap();
        let (leader, rc) = config.require_bootstrap().unwrap();
        assert_eq!(leader.elastic_url, "http://leader:9200");
        assert_eq!(rc, "leader-cluster");
    }

    #[test]
    fn test_flags_only_switch_on() {
        let mut doc = minimal();
        doc["dry_run"] = json!(true);
        let config = Config::parse(&doc.to_string())
            .unwrap()
            .with_overrides(false, true);
        assert!(config.dry_run);
        assert!(config.assume_yes);
    }
}
