// SPDX-FileCopyrightText: 2026 Marquee Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Router fixtures for handler tests.

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::extract::Request;
use axum::http::{HeaderMap, StatusCode};
use marquee_config::MarqueeConfig;
use marquee_core::{MarqueeError, Models, Movie, MovieQuery, MovieStore, User, UserStore};
use marquee_storage::SqliteStore;
use tempfile::TempDir;
use tower::ServiceExt;

use crate::rate_limit::RateLimiter;
use crate::server::{AppState, router};

pub(crate) struct TestApp {
    pub router: Router,
    pub models: Models,
    _dir: Option<TempDir>,
}

fn test_config() -> MarqueeConfig {
    let mut config = MarqueeConfig::default();
    config.limiter.enabled = false;
    config
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    pub async fn with_body_limit(limit: usize) -> Self {
        let mut config = test_config();
        config.server.max_body_bytes = limit;
        Self::with_config(config).await
    }

    async fn with_config(mut config: MarqueeConfig) -> Self {
        let dir = tempfile::tempdir().unwrap();
        config.storage.dsn = dir.path().join("api.db").display().to_string();
        let store = SqliteStore::open(&config.storage).await.unwrap();
        let models = Models::new(Arc::new(store));
        Self::from_models(models, &config, Some(dir))
    }

    fn from_models(models: Models, config: &MarqueeConfig, dir: Option<TempDir>) -> Self {
        let limiter = Arc::new(RateLimiter::new(&config.limiter));
        Self {
            router: router(AppState::new(models.clone(), &config.server), limiter),
            models,
            _dir: dir,
        }
    }

    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        body: Option<&str>,
    ) -> (StatusCode, HeaderMap, serde_json::Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
            .unwrap();
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, headers, json)
    }
}

/// A store whose every call fails with a storage error.
struct BrokenStore;

fn broken() -> MarqueeError {
    MarqueeError::storage(std::io::Error::other("disk on fire"))
}

#[async_trait]
impl MovieStore for BrokenStore {
    async fn insert_movie(&self, _movie: &mut Movie) -> Result<(), MarqueeError> {
        Err(broken())
    }
    async fn get_movie(&self, _id: i64) -> Result<Movie, MarqueeError> {
        Err(broken())
    }
    async fn update_movie(&self, _movie: &mut Movie) -> Result<(), MarqueeError> {
        Err(broken())
    }
    async fn delete_movie(&self, _id: i64) -> Result<(), MarqueeError> {
        Err(broken())
    }
    async fn list_movies(&self, _query: &MovieQuery) -> Result<(Vec<Movie>, i64), MarqueeError> {
        Err(broken())
    }
}

#[async_trait]
impl UserStore for BrokenStore {
    async fn insert_user(&self, _user: &mut User) -> Result<(), MarqueeError> {
        Err(broken())
    }
    async fn get_user_by_email(&self, _email: &str) -> Result<User, MarqueeError> {
        Err(broken())
    }
    async fn update_user(&self, _user: &mut User) -> Result<(), MarqueeError> {
        Err(broken())
    }
}

pub(crate) fn failing_app() -> TestApp {
    TestApp::from_models(Models::new(Arc::new(BrokenStore)), &test_config(), None)
}
