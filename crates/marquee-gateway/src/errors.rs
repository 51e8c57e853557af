// SPDX-FileCopyrightText: 2026 Marquee Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client-facing error responses.
//!
//! Every failure leaves the server as `{"error": ...}` with a matching status
//! code. Internal causes are logged and replaced with a generic message.

use std::collections::BTreeMap;

use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use marquee_core::{MarqueeError, Validator};
use serde::Serialize;
use thiserror::Error;

use crate::envelope::{DecodeError, encode};

pub const NOT_FOUND_MESSAGE: &str = "the requested resource could not be found";
pub const EDIT_CONFLICT_MESSAGE: &str = "unable to edit record due to an edit conflict. please try again";
pub const RATE_LIMITED_MESSAGE: &str = "rate limit exceeded";
pub const SERVER_ERROR_MESSAGE: &str =
    "the server encountered an internal error and could not process your request.";

/// Display strings are what clients see, except for `Internal`, whose cause
/// only reaches the log.
#[derive(Debug, Error)]
pub enum ApiError {
    /// 400 with a reason the client can act on.
    #[error("{0}")]
    BadRequest(String),
    /// 422 with one message per offending field.
    #[error("failed validation")]
    FailedValidation(BTreeMap<String, String>),
    #[error("{}", NOT_FOUND_MESSAGE)]
    NotFound,
    #[error("the {0} method is not supported for this request.")]
    MethodNotAllowed(Method),
    #[error("{}", EDIT_CONFLICT_MESSAGE)]
    EditConflict,
    #[error("{}", RATE_LIMITED_MESSAGE)]
    RateLimited,
    /// 500. The cause is logged, never sent.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::FailedValidation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::EditConflict => StatusCode::CONFLICT,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<Validator> for ApiError {
    fn from(v: Validator) -> Self {
        ApiError::FailedValidation(v.into_errors())
    }
}

impl From<DecodeError> for ApiError {
    fn from(err: DecodeError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<MarqueeError> for ApiError {
    fn from(err: MarqueeError) -> Self {
        match err {
            MarqueeError::NotFound => ApiError::NotFound,
            MarqueeError::EditConflict => ApiError::EditConflict,
            other => ApiError::Internal(other.to_string()),
        }
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum ErrorBody<'a> {
    Message(String),
    Fields(&'a BTreeMap<String, String>),
}

#[derive(Serialize)]
struct ErrorEnvelope<'a> {
    error: ErrorBody<'a>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::FailedValidation(fields) => ErrorBody::Fields(fields),
            ApiError::Internal(cause) => {
                tracing::error!(error = %cause, "internal server error");
                ErrorBody::Message(SERVER_ERROR_MESSAGE.to_string())
            }
            other => ErrorBody::Message(other.to_string()),
        };

        match encode(status, &ErrorEnvelope { error: body }, HeaderMap::new()) {
            Ok(response) => response,
            Err(err) => {
                tracing::error!(error = ?err, "failed to encode error response");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn body_of(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn messages_and_statuses() {
        let cases = [
            (ApiError::NotFound, 404, NOT_FOUND_MESSAGE.to_string()),
            (ApiError::EditConflict, 409, EDIT_CONFLICT_MESSAGE.to_string()),
            (ApiError::RateLimited, 429, RATE_LIMITED_MESSAGE.to_string()),
            (
                ApiError::MethodNotAllowed(Method::DELETE),
                405,
                "the DELETE method is not supported for this request.".to_string(),
            ),
            (
                ApiError::BadRequest("body must not be empty".into()),
                400,
                "body must not be empty".to_string(),
            ),
        ];
        for (err, status, message) in cases {
            let (got_status, body) = body_of(err).await;
            assert_eq!(got_status.as_u16(), status);
            assert_eq!(body["error"], message.as_str());
        }
    }

    #[test]
    fn display_carries_the_internal_cause() {
        let err = ApiError::Internal("pool exhausted".into());
        assert_eq!(err.to_string(), "internal error: pool exhausted");
        assert_eq!(ApiError::NotFound.to_string(), NOT_FOUND_MESSAGE);
    }

    #[tokio::test]
    async fn validation_errors_are_a_field_map() {
        let mut v = Validator::new();
        v.add_error("title", "must be provided");
        v.add_error("year", "must be provided");
        let (status, body) = body_of(ApiError::from(v)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            body,
            serde_json::json!({"error": {"title": "must be provided", "year": "must be provided"}})
        );
    }

    #[tokio::test]
    async fn internal_cause_is_hidden() {
        let err = ApiError::from(MarqueeError::Timeout {
            duration: Duration::from_secs(3),
        });
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], SERVER_ERROR_MESSAGE);
        assert!(!body.to_string().contains("timed out"));
    }

    #[test]
    fn store_errors_map_to_statuses() {
        assert!(matches!(
            ApiError::from(MarqueeError::NotFound),
            ApiError::NotFound
        ));
        assert!(matches!(
            ApiError::from(MarqueeError::EditConflict),
            ApiError::EditConflict
        ));
        assert!(matches!(
            ApiError::from(MarqueeError::Internal("boom".into())),
            ApiError::Internal(_)
        ));
    }
}
