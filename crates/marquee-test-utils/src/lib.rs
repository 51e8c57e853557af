// SPDX-FileCopyrightText: 2026 Marquee Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Marquee integration tests.
//!
//! [`TestHarness`] assembles the full API over a throwaway SQLite database so
//! tests can drive real routes without binding a socket, or start a real
//! listener when they need one.

pub mod harness;

pub use axum::http::{Method, StatusCode};
pub use harness::{RunningServer, TestHarness, TestHarnessBuilder, TestResponse};
