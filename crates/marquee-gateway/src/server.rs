// SPDX-FileCopyrightText: 2026 Marquee Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Router assembly and the top-level serve loop.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::{DefaultBodyLimit, FromRef};
use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use marquee_config::MarqueeConfig;
use marquee_config::model::ServerConfig;
use marquee_core::{MarqueeError, Models};
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, TraceLayer};
use tracing::info;

use crate::envelope::BodyLimit;
use crate::errors::ApiError;
use crate::rate_limit::{RateLimiter, rate_limit};
use crate::shutdown::ShutdownCoordinator;
use crate::{handlers, recover, users};

/// Reported by the healthcheck.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub models: Models,
    pub env: String,
    pub version: &'static str,
    pub max_body_bytes: usize,
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(models: Models, server: &ServerConfig) -> Self {
        Self {
            models,
            env: server.env.clone(),
            version: VERSION,
            max_body_bytes: server.max_body_bytes,
            request_timeout: server.request_timeout(),
        }
    }
}

impl FromRef<AppState> for BodyLimit {
    fn from_ref(state: &AppState) -> Self {
        BodyLimit(state.max_body_bytes)
    }
}

/// Builds the API router. Layers, outermost first: panic recovery, request
/// tracing, rate limiting, request timeout, body limit.
pub fn router(state: AppState, limiter: Arc<RateLimiter>) -> Router {
    let body_limit = state.max_body_bytes;
    let request_timeout = state.request_timeout;

    Router::new()
        .route("/v1/healthcheck", get(handlers::healthcheck))
        .route(
            "/v1/movies",
            get(handlers::list_movies).post(handlers::create_movie),
        )
        .route(
            "/v1/movies/{id}",
            get(handlers::show_movie)
                .patch(handlers::update_movie)
                .put(handlers::update_movie)
                .delete(handlers::delete_movie),
        )
        .route("/v1/users", post(users::register_user))
        .fallback(handlers::not_found)
        .method_not_allowed_fallback(handlers::method_not_allowed)
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(middleware::map_response(timeout_envelope))
        .layer(middleware::from_fn_with_state(limiter, rate_limit))
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::new().level(tracing::Level::INFO)))
        .layer(CatchPanicLayer::custom(recover::handle_panic))
}

/// The timeout layer answers with an empty 408; give it the usual envelope.
async fn timeout_envelope(response: Response) -> Response {
    if response.status() == StatusCode::REQUEST_TIMEOUT {
        ApiError::Internal("request exceeded the server timeout".into()).into_response()
    } else {
        response
    }
}

/// Owns everything a running API needs: routes, the limiter's reaper and the
/// shutdown coordinator.
pub struct Server {
    config: MarqueeConfig,
    models: Models,
    coordinator: Arc<ShutdownCoordinator>,
}

impl Server {
    pub fn new(config: MarqueeConfig, models: Models) -> Self {
        let coordinator = Arc::new(ShutdownCoordinator::new(config.server.shutdown_grace()));
        Self {
            config,
            models,
            coordinator,
        }
    }

    /// Handle for requesting shutdown without a signal.
    pub fn coordinator(&self) -> Arc<ShutdownCoordinator> {
        self.coordinator.clone()
    }

    /// Binds the configured address and serves until shutdown.
    pub async fn run(self) -> Result<(), MarqueeError> {
        let addr = self.config.server.bind_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| MarqueeError::Server {
                message: format!("failed to bind {addr}"),
                source: Some(Box::new(e)),
            })?;
        self.serve(listener).await
    }

    /// Serves on an already-bound listener. Background tasks are joined
    /// before this returns, and "server shut down" is logged only after the
    /// drain has finished.
    pub async fn serve(self, listener: TcpListener) -> Result<(), MarqueeError> {
        let addr = listener
            .local_addr()
            .map_err(|e| MarqueeError::Server {
                message: "listener has no local address".into(),
                source: Some(Box::new(e)),
            })?;

        let limiter = Arc::new(RateLimiter::new(&self.config.limiter));
        let reaper = limiter.spawn_reaper(self.coordinator.token());
        let signals = self.coordinator.spawn_signal_listener();
        let app = router(AppState::new(self.models, &self.config.server), limiter);

        info!(addr = %addr, env = %self.config.server.env, "starting server");
        let result = self.coordinator.serve(listener, app).await;

        // Covers the error path, where no signal cancelled the token.
        self.coordinator.token().cancel();
        let _ = reaper.await;
        let _ = signals.await;

        if result.is_ok() {
            info!(addr = %addr, "server shut down");
        }
        result
    }
}
