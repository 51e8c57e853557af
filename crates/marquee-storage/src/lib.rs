// SPDX-FileCopyrightText: 2026 Marquee Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for the Marquee movie API.
//!
//! WAL-mode SQLite with embedded migrations, a bounded pool of
//! `tokio-rusqlite` connections, and version-checked writes for movies and
//! users. [`SqliteStore`] implements the core store traits.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod queries;

pub use adapter::SqliteStore;
pub use database::Database;
