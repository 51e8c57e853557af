// SPDX-FileCopyrightText: 2026 Marquee Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Lookup: `/etc/marquee/marquee.toml` < `~/.config/marquee/marquee.toml` <
//! `./marquee.toml` (or an explicit path) < `MARQUEE_*` environment variables.
//! Command-line flags are merged on top by the caller.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::MarqueeConfig;

/// Config files consulted when no explicit path is given, lowest priority first.
pub fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("/etc/marquee/marquee.toml")];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("marquee/marquee.toml"));
    }
    paths.push(PathBuf::from("marquee.toml"));
    paths
}

/// Builds the layered Figment without extracting it, so callers can merge
/// command-line overrides on top.
///
/// With `explicit` set, only that file is read (it must exist); otherwise the
/// default hierarchy is used and missing files are skipped.
pub fn build_figment(explicit: Option<&Path>) -> Figment {
    let mut figment = Figment::new().merge(Serialized::defaults(MarqueeConfig::default()));
    match explicit {
        Some(path) => figment = figment.merge(Toml::file_exact(path)),
        None => {
            for path in default_config_paths() {
                figment = figment.merge(Toml::file(path));
            }
        }
    }
    figment.merge(env_provider())
}

/// Loads from the file hierarchy plus environment.
pub fn load_config(explicit: Option<&Path>) -> Result<MarqueeConfig, figment::Error> {
    build_figment(explicit).extract()
}

/// Loads from an inline TOML document on top of the defaults (no env, no files).
pub fn load_config_from_str(toml_content: &str) -> Result<MarqueeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MarqueeConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Renders the effective configuration as TOML.
pub fn to_toml(config: &MarqueeConfig) -> Result<String, toml::ser::Error> {
    toml::to_string_pretty(config)
}

/// Maps `MARQUEE_<SECTION>_<KEY>` onto `section.key`.
///
/// Uses `Env::map()` rather than `Env::split("_")` because keys themselves
/// contain underscores: `MARQUEE_STORAGE_MAX_OPEN_CONNS` must become
/// `storage.max_open_conns`, not `storage.max.open.conns`.
fn env_provider() -> Env {
    Env::prefixed("MARQUEE_").map(|key| {
        let key_str = key.as_str().to_ascii_lowercase();
        for section in ["server", "storage", "limiter", "log"] {
            if let Some(rest) = key_str.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
                return format!("{section}.{rest}").into();
            }
        }
        key_str.into()
    })
}
