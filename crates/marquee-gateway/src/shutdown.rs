// SPDX-FileCopyrightText: 2026 Marquee Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Graceful shutdown.
//!
//! The coordinator moves through `Running`, `ShutdownRequested`, `Draining`
//! and `Stopped`. A signal (or [`ShutdownCoordinator::request_shutdown`])
//! cancels the shared token; the server then stops accepting connections and
//! in-flight requests get the grace period to finish. If they do not, serving
//! ends with [`MarqueeError::Timeout`].

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use marquee_core::MarqueeError;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownState {
    Running,
    ShutdownRequested,
    Draining,
    Stopped,
}

pub struct ShutdownCoordinator {
    token: CancellationToken,
    state: watch::Sender<ShutdownState>,
    grace: Duration,
}

impl ShutdownCoordinator {
    pub fn new(grace: Duration) -> Self {
        let (state, _) = watch::channel(ShutdownState::Running);
        Self {
            token: CancellationToken::new(),
            state,
            grace,
        }
    }

    /// Token cancelled once shutdown is requested. Background tasks select on it.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn state(&self) -> ShutdownState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ShutdownState> {
        self.state.subscribe()
    }

    pub fn grace(&self) -> Duration {
        self.grace
    }

    /// Starts shutdown. Only the first call logs; later calls are no-ops.
    pub fn request_shutdown(&self, signal: &str) {
        let first = self.state.send_if_modified(|state| {
            if *state == ShutdownState::Running {
                *state = ShutdownState::ShutdownRequested;
                true
            } else {
                false
            }
        });
        if first {
            info!(signal, "shutting down server");
        }
        self.token.cancel();
    }

    fn advance(&self, next: ShutdownState) {
        self.state.send_replace(next);
    }

    /// Listens for SIGINT or SIGTERM until a signal arrives or the token is
    /// cancelled some other way.
    pub fn spawn_signal_listener(self: &std::sync::Arc<Self>) -> JoinHandle<()> {
        let coordinator = std::sync::Arc::clone(self);
        tokio::spawn(async move {
            tokio::select! {
                signal = wait_for_signal() => coordinator.request_shutdown(signal),
                _ = coordinator.token.cancelled() => {}
            }
            debug!("signal listener stopped");
        })
    }

    /// Serves `app` on `listener` until shutdown is requested, then drains
    /// within the grace period.
    pub async fn serve(&self, listener: TcpListener, app: Router) -> Result<(), MarqueeError> {
        let token = self.token.clone();
        let server = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move { token.cancelled().await })
        .into_future();
        tokio::pin!(server);

        let result = tokio::select! {
            result = &mut server => result.map_err(serve_error),
            _ = self.token.cancelled() => {
                self.advance(ShutdownState::Draining);
                match tokio::time::timeout(self.grace, &mut server).await {
                    Ok(result) => result.map_err(serve_error),
                    Err(_) => {
                        error!(grace = ?self.grace, "in-flight requests did not finish in time");
                        Err(MarqueeError::Timeout { duration: self.grace })
                    }
                }
            }
        };

        self.advance(ShutdownState::Stopped);
        result
    }
}

fn serve_error(e: std::io::Error) -> MarqueeError {
    MarqueeError::Server {
        message: "HTTP server failed".into(),
        source: Some(Box::new(e)),
    }
}

async fn wait_for_signal() -> &'static str {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => "SIGINT",
            Err(e) => {
                error!(error = %e, "failed to listen for SIGINT");
                std::future::pending().await
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                "SIGTERM"
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<&'static str>();

    tokio::select! {
        signal = ctrl_c => signal,
        signal = terminate => signal,
    }
}
