// SPDX-FileCopyrightText: 2026 Marquee Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Marquee movie catalog API.
//!
//! Domain records, the validation accumulator, paging filters, the runtime
//! wire type, store traits and the shared error type. Storage backends and
//! the HTTP gateway build on the items defined here.

pub mod error;
pub mod filters;
pub mod password;
pub mod runtime;
pub mod traits;
pub mod types;
pub mod validator;

// Re-export key items at crate root for ergonomic imports.
pub use error::MarqueeError;
pub use filters::{Filters, Metadata, SortDirection};
pub use password::Password;
pub use runtime::{InvalidRuntimeFormat, Runtime};
pub use traits::{Models, MovieStore, UserStore};
pub use types::{Movie, MoviePatch, MovieQuery, NewMovie, NewUser, User};
pub use validator::Validator;
