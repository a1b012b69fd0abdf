//! HealthServer: readiness state, check registry and listener lifecycle.

use axum::Router;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use weaver_core::config::HealthConfig;

use crate::chat::ChatProcessor;
use crate::error::HealthServerError;
use crate::handlers;
use crate::types::{Check, CheckStatus};

/// Per-request deadline for every endpoint (chat turns can be long).
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Listener lifecycle. The readiness flag is tracked separately and can be
/// flipped with [`HealthServer::set_ready`] at any phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerPhase {
    NotStarted,
    /// Binding the listener.
    Starting,
    Ready,
    ShuttingDown,
    Stopped,
}

#[derive(Debug)]
struct StatusState {
    ready: bool,
    phase: ServerPhase,
    checks: HashMap<String, Check>,
    local_addr: Option<SocketAddr>,
}

pub(crate) struct Shared {
    config: HealthConfig,
    started_at: Instant,
    state: RwLock<StatusState>,
    pub(crate) processor: Arc<dyn ChatProcessor>,
    shutdown: CancellationToken,
    stopped: CancellationToken,
}

impl Shared {
    // Every write replaces plain values wholesale, so a poisoned lock still
    // guards consistent data.
    fn read_state(&self) -> RwLockReadGuard<'_, StatusState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, StatusState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Readiness flag plus a copy of the checks, taken under one read lock.
    pub(crate) fn snapshot(&self) -> (bool, BTreeMap<String, Check>) {
        let state = self.read_state();
        let checks = state
            .checks
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        (state.ready, checks)
    }
}

/// Status server handle. Cloning is cheap; all clones share one state.
#[derive(Clone)]
pub struct HealthServer {
    shared: Arc<Shared>,
}

impl HealthServer {
    pub fn new(config: HealthConfig, processor: Arc<dyn ChatProcessor>) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                started_at: Instant::now(),
                state: RwLock::new(StatusState {
                    ready: false,
                    phase: ServerPhase::NotStarted,
                    checks: HashMap::new(),
                    local_addr: None,
                }),
                processor,
                shutdown: CancellationToken::new(),
                stopped: CancellationToken::new(),
            }),
        }
    }

    /// Routes for `/health`, `/ready` and `/chat`, bound to this server's state.
    pub fn router(&self) -> Router {
        handlers::router(Arc::clone(&self.shared))
    }

    /// Run `check` now and record its outcome under `name`, replacing any
    /// previous entry. The check runs on the caller's thread with no timeout.
    pub fn register_check<F>(&self, name: impl Into<String>, check: F)
    where
        F: FnOnce() -> (bool, String),
    {
        let name = name.into();
        let (passed, message) = check();
        let entry = Check {
            name: name.clone(),
            status: CheckStatus::from_passed(passed),
            message,
            timestamp: Utc::now(),
        };
        if passed {
            debug!(check = %name, "Health check passed");
        } else {
            warn!(check = %name, message = %entry.message, "Health check failed");
        }
        self.shared.write_state().checks.insert(name, entry);
    }

    pub fn set_ready(&self, ready: bool) {
        self.shared.write_state().ready = ready;
        info!(ready, "Readiness updated");
    }

    pub fn is_ready(&self) -> bool {
        self.shared.read_state().ready
    }

    pub fn phase(&self) -> ServerPhase {
        self.shared.read_state().phase
    }

    pub fn uptime(&self) -> Duration {
        self.shared.uptime()
    }

    /// Address the listener is bound to, once it is bound.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.shared.read_state().local_addr
    }

    /// Copy of the registered checks.
    pub fn checks(&self) -> BTreeMap<String, Check> {
        self.shared.snapshot().1
    }

    /// Bind and serve until [`stop`](Self::stop) is called or the listener fails.
    pub async fn start(&self) -> Result<(), HealthServerError> {
        let listener = self.bind().await?;
        self.clone().serve(listener).await
    }

    /// Bind, serve on a background task, and shut down gracefully once
    /// `cancel` fires. A clean cancellation-triggered shutdown returns `Ok(())`.
    pub async fn start_with_cancel(
        &self,
        cancel: CancellationToken,
    ) -> Result<(), HealthServerError> {
        let listener = self.bind().await?;
        let mut serving = tokio::spawn(self.clone().serve(listener));

        tokio::select! {
            joined = &mut serving => joined?,
            _ = cancel.cancelled() => {
                info!("Cancellation received, shutting down health server");
                self.begin_shutdown();
                serving.await?
            }
        }
    }

    /// Mark not ready, trigger graceful shutdown and wait for in-flight
    /// requests to drain. A server that never started goes straight to `Stopped`.
    pub async fn stop(&self) {
        let prior = self.begin_shutdown();
        debug!(?prior, "Stopping health server");
        self.shared.stopped.cancelled().await;
    }

    fn begin_shutdown(&self) -> ServerPhase {
        let prior = {
            let mut state = self.shared.write_state();
            let prior = state.phase;
            state.ready = false;
            match prior {
                ServerPhase::NotStarted => state.phase = ServerPhase::Stopped,
                ServerPhase::Starting | ServerPhase::Ready => {
                    state.phase = ServerPhase::ShuttingDown
                }
                ServerPhase::ShuttingDown | ServerPhase::Stopped => {}
            }
            prior
        };
        self.shared.shutdown.cancel();
        if prior == ServerPhase::NotStarted {
            self.shared.stopped.cancel();
        }
        prior
    }

    async fn bind(&self) -> Result<TcpListener, HealthServerError> {
        {
            let mut state = self.shared.write_state();
            if state.phase != ServerPhase::NotStarted {
                return Err(HealthServerError::InvalidPhase(state.phase));
            }
            state.phase = ServerPhase::Starting;
        }

        let addr = self.shared.config.bind_addr();
        let listener = match TcpListener::bind(&addr).await {
            Ok(listener) => listener,
            Err(source) => {
                {
                    let mut state = self.shared.write_state();
                    if self.shared.shutdown.is_cancelled() {
                        state.phase = ServerPhase::Stopped;
                    } else {
                        state.phase = ServerPhase::NotStarted;
                    }
                }
                if self.shared.shutdown.is_cancelled() {
                    self.shared.stopped.cancel();
                }
                return Err(HealthServerError::Bind { addr, source });
            }
        };

        let local_addr = listener.local_addr().ok();
        {
            let mut state = self.shared.write_state();
            state.local_addr = local_addr;
            // stop() may have run while binding; leave it shutting down.
            if state.phase == ServerPhase::Starting {
                state.phase = ServerPhase::Ready;
                state.ready = true;
            }
        }
        info!(addr = %addr, local_addr = ?local_addr, "Health server listening");
        Ok(listener)
    }

    async fn serve(self, listener: TcpListener) -> Result<(), HealthServerError> {
        let shutdown = self.shared.shutdown.clone();
        let result = axum::serve(listener, self.router())
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
            .map_err(HealthServerError::Serve);

        {
            let mut state = self.shared.write_state();
            state.ready = false;
            state.phase = ServerPhase::Stopped;
        }
        self.shared.stopped.cancel();
        match &result {
            Ok(()) => info!("Health server stopped"),
            Err(err) => warn!(error = %err, "Health server stopped with error"),
        }
        result
    }
}
