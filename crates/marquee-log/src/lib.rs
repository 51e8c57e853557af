// SPDX-FileCopyrightText: 2026 Marquee Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Structured JSON-line logging for Marquee.
//!
//! Every entry is one JSON object per line with `level`, `time` (UTC RFC3339),
//! `message`, optional `properties`, and a `trace` for ERROR and FATAL. Call
//! sites use plain `tracing` macros; [`init`] installs a subscriber that routes
//! them through a single [`JsonSink`].

pub mod layer;
pub mod sink;

use std::io::Write;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};

pub use layer::JsonLayer;
pub use sink::{JsonSink, Level, SinkWriter, UnknownLevel};

/// Installs the global subscriber: an `EnvFilter` (from `RUST_LOG`, falling
/// back to `default_directives`) in front of a [`JsonLayer`] over `sink`.
pub fn init(sink: JsonSink, default_directives: &str) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives));

    tracing_subscriber::registry()
        .with(filter)
        .with(JsonLayer::new(sink))
        .try_init()
}

/// Routes panic messages through the sink as ERROR entries instead of raw
/// stderr text.
pub fn install_panic_hook(sink: &JsonSink) {
    let writer = sink.writer();
    std::panic::set_hook(Box::new(move |info| {
        // One write per panic so the whole message lands in a single entry.
        let _ = writer.clone().write_all(info.to_string().as_bytes());
    }));
}

/// Logs `err` at FATAL and exits the process with status 1.
pub fn fatal(err: &dyn std::fmt::Display) -> ! {
    tracing::error!(fatal = true, "{err}");
    // Only reached when no `JsonLayer` is installed.
    std::process::exit(1)
}
