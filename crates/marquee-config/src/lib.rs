// SPDX-FileCopyrightText: 2026 Marquee Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for the Marquee API server.
//!
//! TOML files and `MARQUEE_*` environment variables are merged with Figment,
//! unknown keys are rejected (`deny_unknown_fields`), and all failures are
//! reported as miette diagnostics with typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! let config = marquee_config::load_and_validate(marquee_config::build_figment(None))
//!     .expect("config errors");
//! println!("listening on {}", config.server.bind_addr());
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::PathBuf;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{build_figment, load_config, load_config_from_str, to_toml};
pub use model::MarqueeConfig;

/// Extracts and validates a configuration from a prepared Figment.
pub fn load_and_validate(figment: figment::Figment) -> Result<MarqueeConfig, Vec<ConfigError>> {
    let sources = collect_toml_sources(&figment);
    match figment.extract::<MarqueeConfig>() {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err, &sources)),
    }
}

/// Parses and validates an inline TOML document layered over the defaults.
pub fn load_and_validate_str(toml_content: &str) -> Result<MarqueeConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = vec![("<inline>".to_string(), toml_content.to_string())];
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Reads the TOML files the figment draws from, for error spans.
fn collect_toml_sources(figment: &figment::Figment) -> Vec<(String, String)> {
    figment
        .metadata()
        .filter_map(|meta| match meta.source.as_ref() {
            Some(figment::Source::File(path)) => Some(path.clone()),
            _ => None,
        })
        .filter_map(|path: PathBuf| {
            let content = std::fs::read_to_string(&path).ok()?;
            Some((path.display().to_string(), content))
        })
        .collect()
}
