//! Client configuration.

use serde::{Deserialize, Serialize};

use crate::error::ClientError;
use crate::policy::RetryConfig;

/// Settings for the pooled HTTP transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Number of connection pools (bounds blocking-mode concurrency).
    #[serde(default = "default_num_pools")]
    pub num_pools: usize,
    /// Maximum connections kept per pool.
    #[serde(default = "default_max_size")]
    pub max_size: usize,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Connection-level retries performed inside the transport.
    #[serde(default = "default_retries")]
    pub retries: u32,
    /// Wait for a free connection slot instead of opening extra connections.
    #[serde(default)]
    pub pool_block: bool,
    #[serde(default = "bool_true")]
    pub tcp_keepalive: bool,
}

fn default_num_pools() -> usize { 10 }
fn default_max_size() -> usize { 10 }
fn default_timeout_secs() -> u64 { 60 }
fn default_retries() -> u32 { 20 }
fn bool_true() -> bool { true }

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            num_pools: default_num_pools(),
            max_size: default_max_size(),
            timeout_secs: default_timeout_secs(),
            retries: default_retries(),
            pool_block: false,
            tcp_keepalive: true,
        }
    }
}

/// Top-level client configuration, fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Node base URLs, tried in this order.
    pub nodes: Vec<String>,
    /// Pair each result with its request body.
    #[serde(default)]
    pub return_with_args: bool,
    /// Raise RPC and generic errors instead of returning degraded results.
    #[serde(default = "bool_true")]
    pub re_raise: bool,
    /// Dispatcher worker count (`None` = `min(32, cpus + 4)`).
    #[serde(default)]
    pub max_workers: Option<usize>,
    /// API namespaces whose calls are never replayed on another node.
    #[serde(default = "default_no_failover_apis")]
    pub no_failover_apis: Vec<String>,
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    /// Default log verbosity (`error`, `warn`, `info`, `debug`, `trace`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_no_failover_apis() -> Vec<String> {
    vec!["network_broadcast_api".to_string()]
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ClientConfig {
    /// Default configuration for the given nodes.
    pub fn new<I, S>(nodes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            nodes: nodes.into_iter().map(Into::into).collect(),
            return_with_args: false,
            re_raise: true,
            max_workers: None,
            no_failover_apis: default_no_failover_apis(),
            transport: TransportConfig::default(),
            retry: RetryConfig::default(),
            log_level: default_log_level(),
        }
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        if self.nodes.is_empty() {
            return Err(ClientError::Config("node list is empty".into()));
        }
        if self.max_workers == Some(0) {
            return Err(ClientError::Config("max_workers must be at least 1".into()));
        }
        if self.retry.ceiling == 0 {
            return Err(ClientError::Config("retry ceiling must be at least 1".into()));
        }
        Ok(())
    }

    /// Whether calls to `api` may fail over to another node.
    pub fn allows_failover(&self, api: Option<&str>) -> bool {
        api.map_or(true, |api| !self.no_failover_apis.iter().any(|a| a == api))
    }
}
