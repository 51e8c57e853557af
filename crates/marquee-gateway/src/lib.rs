// SPDX-FileCopyrightText: 2026 Marquee Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON HTTP API for the Marquee movie catalog.
//!
//! Routes live under `/v1`. Every response body is a JSON envelope with one
//! top-level key naming its payload; failures use `error`. Requests pass
//! through panic recovery, tracing, per-IP rate limiting and a request
//! timeout before reaching a handler.

pub mod envelope;
pub mod errors;
pub mod handlers;
pub mod query;
pub mod rate_limit;
pub mod recover;
pub mod server;
pub mod shutdown;
pub mod users;

#[cfg(test)]
mod testing;

pub use envelope::{BodyLimit, DecodeError, JsonBody, decode, encode};
pub use errors::ApiError;
pub use rate_limit::RateLimiter;
pub use server::{AppState, Server, router};
pub use shutdown::{ShutdownCoordinator, ShutdownState};
