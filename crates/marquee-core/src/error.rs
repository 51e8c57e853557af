// SPDX-FileCopyrightText: 2026 Marquee Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types shared by the Marquee store, gateway, and binary crates.

use thiserror::Error;

/// The primary error type returned by store operations and server plumbing.
///
/// Request-level failures (validation, decoding, rate limiting) are not
/// represented here; the gateway maps them straight to HTTP responses.
#[derive(Debug, Error)]
pub enum MarqueeError {
    /// Configuration errors (invalid TOML, bad values, unreadable files).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (connection, query failure, row decoding).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// No record matched the requested id.
    #[error("record not found")]
    NotFound,

    /// The record changed (or vanished) between read and write.
    #[error("edit conflict")]
    EditConflict,

    /// A user with the same email already exists.
    #[error("duplicate email")]
    DuplicateEmail,

    /// Listener or HTTP serving failure.
    #[error("server error: {message}")]
    Server {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl MarqueeError {
    /// Wraps any error as a storage failure.
    pub fn storage(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Storage {
            source: Box::new(err),
        }
    }
}
