// SPDX-FileCopyrightText: 2026 Marquee Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::{ENVIRONMENTS, LOG_LEVELS, MarqueeConfig};

/// Checks semantic constraints serde cannot express.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &MarqueeConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let server = &config.server;
    let storage = &config.storage;
    let limiter = &config.limiter;

    if server.host.trim().is_empty() {
        errors.push(ConfigError::validation("server.host must not be empty"));
    }
    if !ENVIRONMENTS.contains(&server.env.as_str()) {
        errors.push(ConfigError::validation(format!(
            "server.env `{}` must be one of: {}",
            server.env,
            ENVIRONMENTS.join(", ")
        )));
    }
    if server.max_body_bytes == 0 {
        errors.push(ConfigError::validation(
            "server.max_body_bytes must be greater than 0",
        ));
    }
    if server.shutdown_grace_secs == 0 {
        errors.push(ConfigError::validation(
            "server.shutdown_grace_secs must be greater than 0",
        ));
    }
    if server.request_timeout_secs == 0 {
        errors.push(ConfigError::validation(
            "server.request_timeout_secs must be greater than 0",
        ));
    }

    if storage.dsn.trim().is_empty() {
        errors.push(ConfigError::validation("storage.dsn must not be empty"));
    }
    if storage.max_open_conns == 0 {
        errors.push(ConfigError::validation(
            "storage.max_open_conns must be at least 1",
        ));
    }
    if storage.max_idle_conns > storage.max_open_conns {
        errors.push(ConfigError::validation(format!(
            "storage.max_idle_conns ({}) must not exceed storage.max_open_conns ({})",
            storage.max_idle_conns, storage.max_open_conns
        )));
    }
    if storage.query_timeout_secs == 0 {
        errors.push(ConfigError::validation(
            "storage.query_timeout_secs must be greater than 0",
        ));
    }
    if storage.ping_timeout_secs == 0 {
        errors.push(ConfigError::validation(
            "storage.ping_timeout_secs must be greater than 0",
        ));
    }

    if limiter.enabled {
        if !(limiter.rps.is_finite() && limiter.rps > 0.0) {
            errors.push(ConfigError::validation(format!(
                "limiter.rps must be a positive number, got {}",
                limiter.rps
            )));
        }
        if limiter.burst == 0 {
            errors.push(ConfigError::validation("limiter.burst must be at least 1"));
        }
        if limiter.sweep_interval_secs == 0 {
            errors.push(ConfigError::validation(
                "limiter.sweep_interval_secs must be greater than 0",
            ));
        }
    }

    if !LOG_LEVELS.contains(&config.log.level.to_ascii_lowercase().as_str()) {
        errors.push(ConfigError::validation(format!(
            "log.level `{}` must be one of: {}",
            config.log.level,
            LOG_LEVELS.join(", ")
        )));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
