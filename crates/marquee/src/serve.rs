// SPDX-FileCopyrightText: 2026 Marquee Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `marquee serve` command implementation.
//!
//! Opens the SQLite store (bounded by the ping timeout), then runs the HTTP
//! server until SIGINT or SIGTERM and the drain that follows.

use std::sync::Arc;

use clap::Args;
use figment::Figment;
use figment::providers::Serialized;
use marquee_config::MarqueeConfig;
use marquee_config::model::LogConfig;
use marquee_core::{MarqueeError, Models};
use marquee_gateway::Server;
use marquee_log::{JsonSink, Level};
use marquee_storage::SqliteStore;
use tracing::info;

/// Flags that override the loaded configuration.
#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// API server port.
    #[arg(long)]
    pub port: Option<u16>,

    /// Environment (development|staging|production).
    #[arg(long)]
    pub env: Option<String>,

    /// SQLite database path.
    #[arg(long)]
    pub dsn: Option<String>,

    /// Rate limiter maximum requests per second.
    #[arg(long)]
    pub limiter_rps: Option<f64>,

    /// Rate limiter maximum burst.
    #[arg(long)]
    pub limiter_burst: Option<u32>,

    /// Enable rate limiter.
    #[arg(long, value_name = "BOOL")]
    pub limiter_enabled: Option<bool>,
}

impl ServeArgs {
    /// Layers the flags that were given on top of `figment`.
    pub fn apply(self, figment: Figment) -> Figment {
        let mut figment = figment;
        if let Some(port) = self.port {
            figment = figment.merge(Serialized::default("server.port", port));
        }
        if let Some(env) = self.env {
            figment = figment.merge(Serialized::default("server.env", env));
        }
        if let Some(dsn) = self.dsn {
            figment = figment.merge(Serialized::default("storage.dsn", dsn));
        }
        if let Some(rps) = self.limiter_rps {
            figment = figment.merge(Serialized::default("limiter.rps", rps));
        }
        if let Some(burst) = self.limiter_burst {
            figment = figment.merge(Serialized::default("limiter.burst", burst));
        }
        if let Some(enabled) = self.limiter_enabled {
            figment = figment.merge(Serialized::default("limiter.enabled", enabled));
        }
        figment
    }
}

/// Installs the JSON-line logger on stdout and routes panics through it.
pub fn init_logging(log: &LogConfig) -> Result<(), MarqueeError> {
    let level: Level = log
        .level
        .parse()
        .map_err(|e| MarqueeError::Config(format!("log.level: {e}")))?;
    let sink = JsonSink::stdout(level);
    marquee_log::init(sink.clone(), "info")
        .map_err(|e| MarqueeError::Internal(format!("failed to install logger: {e}")))?;
    marquee_log::install_panic_hook(&sink);
    Ok(())
}

/// Runs the API until shutdown completes.
pub async fn run_serve(config: MarqueeConfig) -> Result<(), MarqueeError> {
    let store = SqliteStore::open(&config.storage).await?;
    info!(dsn = %config.storage.dsn, "database connection pool established");

    let database = store.database().clone();
    let models = Models::new(Arc::new(store));
    let result = Server::new(config, models).run().await;

    database.close_idle();
    result
}
