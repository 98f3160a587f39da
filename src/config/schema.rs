//! Configuration schema definitions.
//!
//! This module defines the configuration file structure for the gateway.
//! All types derive Serde traits for deserialization from TOML or YAML.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Interface to bind.
    pub host: String,

    /// Port to listen on. 0 means the default of 80.
    pub port: u16,

    /// Database connection settings.
    pub db: DbConfig,

    /// Route definitions binding HTTP requests to SQL statements.
    pub rules: Vec<RuleConfig>,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request size limits.
    pub limits: LimitsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

pub const DEFAULT_PORT: u16 = 80;

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            db: DbConfig::default(),
            rules: Vec::new(),
            timeouts: TimeoutConfig::default(),
            limits: LimitsConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Port after normalization.
    pub fn effective_port(&self) -> u16 {
        if self.port == 0 {
            DEFAULT_PORT
        } else {
            self.port
        }
    }

    /// `host:port` to bind the listener to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.effective_port())
    }
}

/// Parameters for opening the database.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DbConfig {
    /// Driver name (`sqlite3` or `sqlite`).
    pub driver: String,

    /// Database file, or `:memory:`.
    pub filepath: String,

    /// Number of pooled connections.
    pub pool_size: usize,

    /// How long SQLite waits on a locked database, in milliseconds.
    pub busy_timeout_ms: u64,

    /// Attempts to open the database before giving up.
    pub connect_attempts: u32,

    /// Base delay for exponential backoff between attempts, in milliseconds.
    pub connect_base_delay_ms: u64,

    /// Maximum delay between attempts, in milliseconds.
    pub connect_max_delay_ms: u64,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            driver: "sqlite3".to_string(),
            filepath: String::new(),
            pool_size: 4,
            busy_timeout_ms: 1000,
            connect_attempts: 5,
            connect_base_delay_ms: 200,
            connect_max_delay_ms: 5000,
        }
    }
}

/// One rule as written in the config file.
///
/// Singular and plural statement fields are alternatives; normalization
/// rejects rules that set both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RuleConfig {
    pub path: String,
    pub method: String,
    pub before: String,
    pub befores: Vec<String>,
    pub query: String,
    pub queries: Vec<String>,
    pub after: String,
    pub afters: Vec<String>,
    pub transaction: bool,
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total time for a request/response in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
