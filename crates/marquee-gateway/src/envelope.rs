// SPDX-FileCopyrightText: 2026 Marquee Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON request decoding and response encoding.
//!
//! Request bodies must hold exactly one JSON object, must fit under the body
//! limit, and may only name fields the target type declares. Every failure is
//! classified into a [`DecodeError`] whose message is safe to show clients.
//! Decoding into a type that cannot be deserialized is a compile error, so
//! there is no runtime misuse case to report.

use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, FailedToBufferBody};
use axum::extract::{FromRef, FromRequest, Request};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde_json::error::Category;
use serde_json::ser::PrettyFormatter;
use thiserror::Error;

use crate::errors::ApiError;

/// Default cap on request body size.
pub const DEFAULT_MAX_BODY_BYTES: usize = 1_048_576;

/// Why a request body could not be decoded. Display strings are client-facing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("body contains badly-formed JSON (at character {offset})")]
    Syntax { offset: usize },

    #[error("body contains badly-formed JSON")]
    Truncated,

    #[error("body contains incorrect JSON type for field \"{field}\"")]
    TypeMismatch { field: String },

    #[error("body contains incorrect JSON type (at character {offset})")]
    TypeMismatchAt { offset: usize },

    #[error("body must not be empty")]
    Empty,

    #[error("body contains unknown key \"{0}\"")]
    UnknownField(String),

    #[error("body must not be larger than {limit} bytes")]
    TooLarge { limit: usize },

    #[error("body must only contain a single JSON value")]
    MultipleValues,

    /// A field's own decoder rejected its value, e.g. a malformed runtime.
    #[error("{0}")]
    Invalid(String),
}

/// Decodes exactly one JSON object of type `T` from `body`.
pub fn decode<T: DeserializeOwned>(body: &[u8], max_bytes: usize) -> Result<T, DecodeError> {
    if body.len() > max_bytes {
        return Err(DecodeError::TooLarge { limit: max_bytes });
    }
    let Some(start) = body.iter().position(|b| !b.is_ascii_whitespace()) else {
        return Err(DecodeError::Empty);
    };
    if body[start] != b'{' {
        return Err(non_object(body, start));
    }

    let mut de = serde_json::Deserializer::from_slice(body);
    let value = serde_path_to_error::deserialize(&mut de).map_err(|e| classify(e, body))?;
    de.end().map_err(|_| DecodeError::MultipleValues)?;
    Ok(value)
}

/// Derived struct decoders also accept positional arrays, which would bypass
/// the field-name checks. Well-formed values that are not objects are type
/// errors; anything else keeps its syntax classification.
fn non_object(body: &[u8], start: usize) -> DecodeError {
    let mut de = serde_json::Deserializer::from_slice(body);
    match serde_path_to_error::deserialize::<_, IgnoredAny>(&mut de) {
        Ok(_) => DecodeError::TypeMismatchAt { offset: start + 1 },
        Err(e) => classify(e, body),
    }
}

fn classify(err: serde_path_to_error::Error<serde_json::Error>, body: &[u8]) -> DecodeError {
    let path = err.path().to_string();
    let inner = err.into_inner();
    let offset = byte_offset(body, inner.line(), inner.column());

    match inner.classify() {
        Category::Eof => DecodeError::Truncated,
        Category::Syntax | Category::Io => DecodeError::Syntax { offset },
        Category::Data => {
            let full = inner.to_string();
            // serde_json appends the position; clients get it separately.
            let message = full
                .rsplit_once(" at line ")
                .map_or(full.as_str(), |(m, _)| m);

            if let Some(rest) = message.strip_prefix("unknown field `") {
                let name = rest.split('`').next().unwrap_or_default();
                DecodeError::UnknownField(name.to_string())
            } else if is_type_error(message) {
                if path == "." {
                    DecodeError::TypeMismatchAt { offset }
                } else {
                    DecodeError::TypeMismatch { field: path }
                }
            } else {
                DecodeError::Invalid(message.to_string())
            }
        }
    }
}

fn is_type_error(message: &str) -> bool {
    ["invalid type:", "invalid value:", "invalid length"]
        .iter()
        .any(|prefix| message.starts_with(prefix))
}

/// Converts serde_json's 1-based line and column into a byte count from the
/// start of the body.
fn byte_offset(body: &[u8], line: usize, column: usize) -> usize {
    let line_start: usize = body
        .split_inclusive(|&b| b == b'\n')
        .take(line.saturating_sub(1))
        .map(<[u8]>::len)
        .sum();
    line_start + column
}

/// Request body cap, pulled from application state by [`JsonBody`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyLimit(pub usize);

impl Default for BodyLimit {
    fn default() -> Self {
        Self(DEFAULT_MAX_BODY_BYTES)
    }
}

/// Extractor that decodes the request body with [`decode`].
///
/// Pair it with `DefaultBodyLimit::max` set to the same limit so oversized
/// bodies are cut off while streaming.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
    BodyLimit: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let BodyLimit(limit) = BodyLimit::from_ref(state);
        let bytes = match Bytes::from_request(req, state).await {
            Ok(bytes) => bytes,
            Err(BytesRejection::FailedToBufferBody(FailedToBufferBody::LengthLimitError(_))) => {
                return Err(DecodeError::TooLarge { limit }.into());
            }
            Err(rejection) => return Err(ApiError::BadRequest(rejection.body_text())),
        };
        decode(&bytes, limit).map(JsonBody).map_err(ApiError::from)
    }
}

/// Serializes `data` with tab indentation and a trailing newline, then
/// merges `headers` and sets the JSON content type.
pub fn encode<T: Serialize + ?Sized>(
    status: StatusCode,
    data: &T,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let mut buf = Vec::with_capacity(128);
    let mut ser =
        serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"\t"));
    data.serialize(&mut ser)
        .map_err(|e| ApiError::Internal(format!("encode response: {e}")))?;
    buf.push(b'\n');

    let mut response = (status, buf).into_response();
    let out = response.headers_mut();
    out.extend(headers);
    out.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(response)
}
