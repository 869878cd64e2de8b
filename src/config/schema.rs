//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the document gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Route prefix settings for the document API.
    pub api: ApiConfig,

    /// The backing database reached through the pool.
    pub database: DatabaseConfig,

    /// Membership discovery settings.
    pub discovery: DiscoveryConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Route prefix for the document endpoints: `/{base_path}/{version}/...`.
/// The healthcheck stays at the root regardless.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_path: String,
    pub version: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_path: "api".to_string(),
            version: "v1".to_string(),
        }
    }
}

/// The database every pooled connection points at.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Driver kind; only "couchdb" is supported.
    pub kind: String,

    /// Database name, appended to every backend address.
    pub name: String,

    /// Per-request timeout for backend calls, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            kind: "couchdb".to_string(),
            name: "documents".to_string(),
            request_timeout_secs: 5,
        }
    }
}

/// Membership discovery settings.
///
/// A non-empty `static_instances` list disables the Consul watcher and pins
/// membership to the listed addresses.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Base URL of the Consul HTTP API.
    pub consul_address: String,

    /// Consul service whose healthy instances form the pool.
    pub service_name: String,

    /// Optional Consul datacenter.
    pub datacenter: Option<String>,

    /// Blocking-query wait per poll, in seconds.
    pub wait_secs: u64,

    /// Backoff ramp for failed polls, in milliseconds.
    pub backoff_base_ms: u64,
    pub backoff_max_ms: u64,

    /// Fixed backend addresses; bypasses Consul when non-empty.
    pub static_instances: Vec<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            consul_address: "http://127.0.0.1:8500".to_string(),
            service_name: "couchdb".to_string(),
            datacenter: None,
            wait_secs: 30,
            backoff_base_ms: 500,
            backoff_max_ms: 30_000,
            static_instances: Vec::new(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Whole-request deadline enforced by the HTTP layer, in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    /// Bind address of the Prometheus scrape endpoint.
    pub metrics_address: String,

    /// Deployment grouping label attached to every metric series.
    pub service_group: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
            service_group: "documents".to_string(),
        }
    }
}
