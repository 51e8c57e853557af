// SPDX-FileCopyrightText: 2026 Marquee Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Movie and healthcheck handlers.

use axum::extract::rejection::PathRejection;
use axum::extract::{FromRequest, Path, Query, Request, State};
use axum::http::header::LOCATION;
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::Response;
use marquee_core::types::MOVIE_SORT_SAFELIST;
use marquee_core::{Filters, Metadata, Movie, MoviePatch, MovieQuery, NewMovie, Validator};
use serde::Serialize;

use crate::envelope::{JsonBody, encode};
use crate::errors::ApiError;
use crate::query::{QueryParams, read_csv, read_int, read_string};
use crate::server::AppState;

#[derive(Serialize)]
struct SystemInfo<'a> {
    environment: &'a str,
    version: &'a str,
}

#[derive(Serialize)]
struct Health<'a> {
    status: &'static str,
    system_info: SystemInfo<'a>,
}

#[derive(Serialize)]
struct MovieEnvelope<'a> {
    movie: &'a Movie,
}

#[derive(Serialize)]
struct MoviesEnvelope<'a> {
    metadata: Metadata,
    movies: &'a [Movie],
}

#[derive(Serialize)]
struct MessageEnvelope {
    message: &'static str,
}

pub async fn healthcheck(State(state): State<AppState>) -> Result<Response, ApiError> {
    let health = Health {
        status: "available",
        system_info: SystemInfo {
            environment: &state.env,
            version: state.version,
        },
    };
    encode(StatusCode::OK, &health, HeaderMap::new())
}

/// Parses the `{id}` segment. Anything but a positive integer is a 404.
fn movie_id(path: Result<Path<String>, PathRejection>) -> Result<i64, ApiError> {
    let Ok(Path(raw)) = path else {
        return Err(ApiError::NotFound);
    };
    match raw.parse::<i64>() {
        Ok(id) if id >= 1 => Ok(id),
        _ => Err(ApiError::NotFound),
    }
}

pub async fn create_movie(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<NewMovie>,
) -> Result<Response, ApiError> {
    let mut movie = Movie::from(input);

    let mut v = Validator::new();
    movie.validate(&mut v);
    if !v.is_valid() {
        return Err(v.into());
    }

    state.models.movies.insert_movie(&mut movie).await?;

    let location = HeaderValue::from_str(&format!("/v1/movies/{}", movie.id))
        .map_err(|e| ApiError::Internal(format!("location header: {e}")))?;
    let mut headers = HeaderMap::new();
    headers.insert(LOCATION, location);

    encode(StatusCode::CREATED, &MovieEnvelope { movie: &movie }, headers)
}

pub async fn show_movie(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Response, ApiError> {
    let id = movie_id(path)?;
    let movie = state.models.movies.get_movie(id).await?;
    encode(StatusCode::OK, &MovieEnvelope { movie: &movie }, HeaderMap::new())
}

/// Serves both PATCH and PUT: fields present in the body overwrite, absent
/// fields are kept.
///
/// The id is checked before the body is read, so a bad id is a 404 whatever
/// the body holds.
pub async fn update_movie(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    request: Request,
) -> Result<Response, ApiError> {
    let id = movie_id(path)?;
    let JsonBody(patch) = JsonBody::<MoviePatch>::from_request(request, &state).await?;
    let mut movie = state.models.movies.get_movie(id).await?;
    movie.apply(patch);

    let mut v = Validator::new();
    movie.validate(&mut v);
    if !v.is_valid() {
        return Err(v.into());
    }

    state.models.movies.update_movie(&mut movie).await?;
    encode(StatusCode::OK, &MovieEnvelope { movie: &movie }, HeaderMap::new())
}

pub async fn delete_movie(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Response, ApiError> {
    let id = movie_id(path)?;
    state.models.movies.delete_movie(id).await?;
    encode(
        StatusCode::OK,
        &MessageEnvelope {
            message: "movie successfully deleted",
        },
        HeaderMap::new(),
    )
}

pub async fn list_movies(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> Result<Response, ApiError> {
    let mut v = Validator::new();
    let query = MovieQuery {
        title: read_string(&params, "title", ""),
        genres: read_csv(&params, "genres", &[]),
        filters: Filters {
            page: read_int(&params, "page", 1, &mut v),
            page_size: read_int(&params, "page_size", 10, &mut v),
            sort: read_string(&params, "sort", "id"),
            sort_safelist: MOVIE_SORT_SAFELIST,
        },
    };
    query.filters.validate(&mut v);
    if !v.is_valid() {
        return Err(v.into());
    }

    let (movies, total) = state.models.movies.list_movies(&query).await?;
    let metadata = Metadata::calculate(total, query.filters.page, query.filters.page_size);
    encode(
        StatusCode::OK,
        &MoviesEnvelope {
            metadata,
            movies: &movies,
        },
        HeaderMap::new(),
    )
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

pub async fn method_not_allowed(method: Method) -> ApiError {
    ApiError::MethodNotAllowed(method)
}
