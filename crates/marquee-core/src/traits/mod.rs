// SPDX-FileCopyrightText: 2026 Marquee Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Store traits implemented by persistence backends.

pub mod store;

pub use store::{Models, MovieStore, UserStore};
