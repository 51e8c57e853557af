// SPDX-FileCopyrightText: 2026 Marquee Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end API tests.
//!
//! Each harness owns a temp directory holding its database, so harnesses are
//! independent and tests can run in parallel.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::extract::Request;
use axum::http::{HeaderMap, Method, StatusCode};
use marquee_config::MarqueeConfig;
use marquee_core::{MarqueeError, Models};
use marquee_gateway::{AppState, RateLimiter, Server, ShutdownCoordinator, router};
use marquee_storage::SqliteStore;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower::ServiceExt;

/// Default client address for requests that do not name one.
const DEFAULT_CLIENT: SocketAddr = SocketAddr::new(
    std::net::IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
    40000,
);

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    config: MarqueeConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        let mut config = MarqueeConfig::default();
        config.limiter.enabled = false;
        config.server.host = "127.0.0.1".into();
        config.server.port = 0;
        Self { config }
    }

    /// Turns rate limiting on with the given refill rate and burst.
    pub fn with_rate_limit(mut self, rps: f64, burst: u32) -> Self {
        self.config.limiter.enabled = true;
        self.config.limiter.rps = rps;
        self.config.limiter.burst = burst;
        self
    }

    pub fn with_body_limit(mut self, bytes: usize) -> Self {
        self.config.server.max_body_bytes = bytes;
        self
    }

    pub fn with_env(mut self, env: &str) -> Self {
        self.config.server.env = env.to_string();
        self
    }

    pub fn with_shutdown_grace_secs(mut self, secs: u64) -> Self {
        self.config.server.shutdown_grace_secs = secs;
        self
    }

    /// Opens the temp database and builds the router.
    pub async fn build(mut self) -> Result<TestHarness, MarqueeError> {
        let temp_dir = TempDir::new().map_err(MarqueeError::storage)?;
        self.config.storage.dsn = temp_dir.path().join("test.db").display().to_string();

        let store = SqliteStore::open(&self.config.storage).await?;
        let models = Models::new(Arc::new(store));
        let limiter = Arc::new(RateLimiter::new(&self.config.limiter));
        let router = router(AppState::new(models.clone(), &self.config.server), limiter);

        Ok(TestHarness {
            config: self.config,
            models,
            router,
            _temp_dir: temp_dir,
        })
    }
}

/// A decoded response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// `Null` when the body was empty.
    pub body: serde_json::Value,
}

impl TestResponse {
    /// The `error` member of an error envelope.
    pub fn error(&self) -> &serde_json::Value {
        &self.body["error"]
    }
}

/// A server bound to an ephemeral port.
pub struct RunningServer {
    pub addr: SocketAddr,
    pub coordinator: Arc<ShutdownCoordinator>,
    pub handle: JoinHandle<Result<(), MarqueeError>>,
}

/// Complete API over a temp database.
pub struct TestHarness {
    pub config: MarqueeConfig,
    pub models: Models,
    pub router: Router,
    _temp_dir: TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Sends a request as the default client.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<&str>,
    ) -> TestResponse {
        self.request_from(DEFAULT_CLIENT, method, uri, body).await
    }

    /// Sends a request that appears to come from `client`.
    pub async fn request_from(
        &self,
        client: SocketAddr,
        method: Method,
        uri: &str,
        body: Option<&str>,
    ) -> TestResponse {
        let mut request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
            .expect("valid test request");
        request.extensions_mut().insert(ConnectInfo(client));

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("readable response body");
        let body = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("response body is JSON")
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: &str) -> TestResponse {
        self.request(Method::POST, uri, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, body: &str) -> TestResponse {
        self.request(Method::PATCH, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> TestResponse {
        self.request(Method::DELETE, uri, None).await
    }

    /// Starts a real server over the same database on `127.0.0.1:0`.
    pub async fn serve(&self) -> Result<RunningServer, MarqueeError> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| MarqueeError::Server {
                message: "failed to bind test listener".into(),
                source: Some(Box::new(e)),
            })?;
        let addr = listener.local_addr().map_err(|e| MarqueeError::Server {
            message: "test listener has no address".into(),
            source: Some(Box::new(e)),
        })?;

        let server = Server::new(self.config.clone(), self.models.clone());
        let coordinator = server.coordinator();
        let handle = tokio::spawn(server.serve(listener));
        Ok(RunningServer {
            addr,
            coordinator,
            handle,
        })
    }
}
