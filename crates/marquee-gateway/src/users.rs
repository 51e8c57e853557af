// SPDX-FileCopyrightText: 2026 Marquee Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User registration.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use marquee_core::{MarqueeError, NewUser, User, Validator};
use serde::Serialize;

use crate::envelope::{JsonBody, encode};
use crate::errors::ApiError;
use crate::server::AppState;

#[derive(Serialize)]
struct UserEnvelope<'a> {
    user: &'a User,
}

pub async fn register_user(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<NewUser>,
) -> Result<Response, ApiError> {
    let NewUser {
        name,
        email,
        password,
    } = input;

    // Hashing blocks; run it off the async workers.
    let mut user = tokio::task::spawn_blocking(move || User::new(name, email, &password))
        .await
        .map_err(|e| ApiError::Internal(format!("password hashing task failed: {e}")))??;

    let mut v = Validator::new();
    user.validate(&mut v);
    if !v.is_valid() {
        return Err(v.into());
    }

    match state.models.users.insert_user(&mut user).await {
        Ok(()) => {}
        Err(MarqueeError::DuplicateEmail) => {
            v.add_error("email", "a user with this email already exists");
            return Err(v.into());
        }
        Err(e) => return Err(e.into()),
    }

    encode(StatusCode::CREATED, &UserEnvelope { user: &user }, HeaderMap::new())
}
