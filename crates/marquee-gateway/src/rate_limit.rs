// SPDX-FileCopyrightText: 2026 Marquee Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-client token-bucket rate limiting.
//!
//! Each client IP gets its own bucket, created full on first sight. Lookup,
//! refill and consume happen under one lock so the check is atomic per
//! client. A reaper task forgets clients that have been quiet longer than
//! the idle TTL.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use marquee_config::model::LimiterConfig;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::errors::ApiError;

struct TokenBucket {
    tokens: f64,
    capacity: f64,
    refill_per_sec: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn full(refill_per_sec: f64, burst: u32, now: Instant) -> Self {
        let capacity = f64::from(burst);
        Self {
            tokens: capacity,
            capacity,
            refill_per_sec,
            last_refill: now,
        }
    }

    fn try_take(&mut self, now: Instant) -> bool {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        self.last_refill = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

struct Client {
    bucket: TokenBucket,
    last_seen: Instant,
}

pub struct RateLimiter {
    enabled: bool,
    rps: f64,
    burst: u32,
    sweep_interval: Duration,
    idle_ttl: Duration,
    clients: Mutex<HashMap<IpAddr, Client>>,
}

impl RateLimiter {
    pub fn new(config: &LimiterConfig) -> Self {
        Self {
            enabled: config.enabled,
            rps: config.rps,
            burst: config.burst,
            sweep_interval: config.sweep_interval(),
            idle_ttl: config.idle_ttl(),
            clients: Mutex::new(HashMap::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Takes one token from `ip`'s bucket. Always true when disabled.
    pub fn allow(&self, ip: IpAddr) -> bool {
        if !self.enabled {
            return true;
        }
        let now = Instant::now();
        let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);
        let client = clients.entry(ip).or_insert_with(|| Client {
            bucket: TokenBucket::full(self.rps, self.burst, now),
            last_seen: now,
        });
        client.last_seen = now;
        client.bucket.try_take(now)
    }

    /// Drops clients idle for longer than the TTL; returns how many went.
    pub fn sweep(&self) -> usize {
        let ttl = self.idle_ttl;
        let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);
        let before = clients.len();
        clients.retain(|_, client| client.last_seen.elapsed() <= ttl);
        before - clients.len()
    }

    pub fn tracked_clients(&self) -> usize {
        self.clients
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Sweeps every `sweep_interval` until `cancel` fires.
    pub fn spawn_reaper(self: &Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        let limiter = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(limiter.sweep_interval);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let removed = limiter.sweep();
                        if removed > 0 {
                            debug!(removed, "evicted idle rate-limit clients");
                        }
                    }
                }
            }
            debug!("rate-limit reaper stopped");
        })
    }
}

fn client_ip(request: &Request) -> Option<IpAddr> {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
}

/// Rejects requests with 429 once the caller's bucket is empty.
pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    if !limiter.is_enabled() {
        return next.run(request).await;
    }
    let Some(ip) = client_ip(&request) else {
        return ApiError::Internal("client address unavailable".into()).into_response();
    };
    if !limiter.allow(ip) {
        return ApiError::RateLimited.into_response();
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::body::Body;
    use axum::http::StatusCode;
    use axum::middleware;
    use axum::routing::get;
    use tower::ServiceExt;

    fn config(rps: f64, burst: u32) -> LimiterConfig {
        LimiterConfig {
            rps,
            burst,
            ..LimiterConfig::default()
        }
    }

    fn ip(last: u8) -> IpAddr {
        IpAddr::from([10, 0, 0, last])
    }

    #[tokio::test(start_paused = true)]
    async fn burst_then_refill() {
        let limiter = RateLimiter::new(&config(2.0, 4));
        let results: Vec<bool> = (0..5).map(|_| limiter.allow(ip(1))).collect();
        assert_eq!(results, vec![true, true, true, true, false]);

        tokio::time::advance(Duration::from_millis(500)).await;
        assert!(limiter.allow(ip(1)));
        assert!(!limiter.allow(ip(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn clients_have_independent_buckets() {
        let limiter = RateLimiter::new(&config(1.0, 1));
        assert!(limiter.allow(ip(1)));
        assert!(!limiter.allow(ip(1)));
        assert!(limiter.allow(ip(2)));
        assert_eq!(limiter.tracked_clients(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn refill_is_capped_at_burst() {
        let limiter = RateLimiter::new(&config(2.0, 2));
        assert!(limiter.allow(ip(1)));
        tokio::time::advance(Duration::from_secs(60)).await;
        assert!(limiter.allow(ip(1)));
        assert!(limiter.allow(ip(1)));
        assert!(!limiter.allow(ip(1)));
    }

    #[test]
    fn disabled_limiter_allows_everything() {
        let limiter = RateLimiter::new(&LimiterConfig {
            enabled: false,
            ..config(1.0, 1)
        });
        assert!((0..100).all(|_| limiter.allow(ip(1))));
        assert_eq!(limiter.tracked_clients(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_forgets_idle_clients() {
        let limiter = RateLimiter::new(&config(2.0, 4));
        limiter.allow(ip(1));
        tokio::time::advance(Duration::from_secs(120)).await;
        limiter.allow(ip(2));
        tokio::time::advance(Duration::from_secs(61)).await;

        assert_eq!(limiter.sweep(), 1);
        assert_eq!(limiter.tracked_clients(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn reaper_runs_until_cancelled() {
        let limiter = Arc::new(RateLimiter::new(&config(2.0, 4)));
        for _ in 0..4 {
            limiter.allow(ip(1));
        }
        let cancel = CancellationToken::new();
        let reaper = limiter.spawn_reaper(cancel.clone());

        for _ in 0..4 {
            tokio::time::advance(Duration::from_secs(60)).await;
            tokio::task::yield_now().await;
        }
        for _ in 0..10 {
            if limiter.tracked_clients() == 0 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(limiter.tracked_clients(), 0);

        // A forgotten client starts over with a full bucket.
        assert!((0..4).all(|_| limiter.allow(ip(1))));

        cancel.cancel();
        reaper.await.unwrap();
    }

    fn app(limiter: Arc<RateLimiter>) -> Router {
        Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(middleware::from_fn_with_state(limiter, rate_limit))
    }

    fn request_from(addr: SocketAddr) -> Request {
        let mut request = Request::builder().uri("/").body(Body::empty()).unwrap();
        request.extensions_mut().insert(ConnectInfo(addr));
        request
    }

    #[tokio::test(start_paused = true)]
    async fn middleware_rejects_with_429_envelope() {
        let app = app(Arc::new(RateLimiter::new(&config(2.0, 4))));
        let addr: SocketAddr = "192.0.2.1:5000".parse().unwrap();

        for _ in 0..4 {
            let response = app.clone().oneshot(request_from(addr)).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
        let response = app.clone().oneshot(request_from(addr)).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "rate limit exceeded");

        // Another port on the same host shares the bucket.
        let same_host: SocketAddr = "192.0.2.1:6000".parse().unwrap();
        let response = app.clone().oneshot(request_from(same_host)).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn missing_client_address_is_an_internal_error() {
        let limiter = Arc::new(RateLimiter::new(&config(1.0, 1)));
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();

        let response = app(limiter.clone()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(limiter.tracked_clients(), 0);
    }
}
