// SPDX-FileCopyrightText: 2026 Marquee Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Marquee API server.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so a misspelled key is a
//! startup error rather than a silently ignored setting.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Environments the server may report in its healthcheck.
pub const ENVIRONMENTS: &[&str] = &["development", "staging", "production"];

/// Accepted values for `log.level`.
pub const LOG_LEVELS: &[&str] = &["info", "error", "fatal", "off"];

/// Top-level Marquee configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MarqueeConfig {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Database settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Per-client rate limiting.
    #[serde(default)]
    pub limiter: LimiterConfig,

    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    /// Listen port. 0 picks an ephemeral port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Operating environment (development|staging|production).
    #[serde(default = "default_env")]
    pub env: String,

    /// Largest accepted request body in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// How long in-flight requests get to finish after a shutdown signal.
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,

    /// Upper bound on handling a single request.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            env: default_env(),
            max_body_bytes: default_max_body_bytes(),
            shutdown_grace_secs: default_shutdown_grace_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_env() -> String {
    "development".to_string()
}

fn default_max_body_bytes() -> usize {
    1_048_576
}

fn default_shutdown_grace_secs() -> u64 {
    5
}

fn default_request_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// SQLite database path.
    #[serde(default = "default_dsn")]
    pub dsn: String,

    #[serde(default = "default_max_open_conns")]
    pub max_open_conns: usize,

    #[serde(default = "default_max_idle_conns")]
    pub max_idle_conns: usize,

    /// Idle connections older than this are closed instead of reused.
    #[serde(default = "default_max_idle_time_secs")]
    pub max_idle_time_secs: u64,

    /// Deadline for every store operation.
    #[serde(default = "default_query_timeout_secs")]
    pub query_timeout_secs: u64,

    /// Deadline for the startup connectivity check.
    #[serde(default = "default_ping_timeout_secs")]
    pub ping_timeout_secs: u64,
}

impl StorageConfig {
    pub fn max_idle_time(&self) -> Duration {
        Duration::from_secs(self.max_idle_time_secs)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }

    pub fn ping_timeout(&self) -> Duration {
        Duration::from_secs(self.ping_timeout_secs)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dsn: default_dsn(),
            max_open_conns: default_max_open_conns(),
            max_idle_conns: default_max_idle_conns(),
            max_idle_time_secs: default_max_idle_time_secs(),
            query_timeout_secs: default_query_timeout_secs(),
            ping_timeout_secs: default_ping_timeout_secs(),
        }
    }
}

fn default_dsn() -> String {
    "marquee.db".to_string()
}

fn default_max_open_conns() -> usize {
    25
}

fn default_max_idle_conns() -> usize {
    25
}

fn default_max_idle_time_secs() -> u64 {
    900
}

fn default_query_timeout_secs() -> u64 {
    3
}

fn default_ping_timeout_secs() -> u64 {
    5
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LimiterConfig {
    /// Token refill rate per client, in requests per second.
    #[serde(default = "default_rps")]
    pub rps: f64,

    /// Bucket capacity per client.
    #[serde(default = "default_burst")]
    pub burst: u32,

    #[serde(default = "default_true")]
    pub enabled: bool,

    /// How often idle clients are swept.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// A client unseen for this long is forgotten.
    #[serde(default = "default_idle_ttl_secs")]
    pub idle_ttl_secs: u64,
}

impl LimiterConfig {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn idle_ttl(&self) -> Duration {
        Duration::from_secs(self.idle_ttl_secs)
    }
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            rps: default_rps(),
            burst: default_burst(),
            enabled: default_true(),
            sweep_interval_secs: default_sweep_interval_secs(),
            idle_ttl_secs: default_idle_ttl_secs(),
        }
    }
}

fn default_rps() -> f64 {
    2.0
}

fn default_burst() -> u32 {
    4
}

fn default_true() -> bool {
    true
}

fn default_sweep_interval_secs() -> u64 {
    60
}

fn default_idle_ttl_secs() -> u64 {
    180
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Minimum level written (info|error|fatal|off).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
