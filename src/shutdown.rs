//! Graceful shutdown on SIGINT/SIGTERM.
//!
//! The coordinator owns a [`CancellationToken`] that the HTTP server watches
//! through `with_graceful_shutdown`. Once cancelled, the server stops
//! accepting connections and in-flight requests get `drain_timeout` to finish
//! before the remaining connections are dropped.
//!
//! # Example
//!
//! ```rust,no_run
//! use receipt_processor::shutdown::{ShutdownConfig, ShutdownCoordinator};
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let coordinator = Arc::new(ShutdownCoordinator::new(ShutdownConfig::default()));
//! coordinator.clone().listen_for_signals();
//!
//! let token = coordinator.token();
//! let server = async move {
//!     token.cancelled().await;
//!     Ok::<(), std::io::Error>(())
//! };
//! coordinator.drive(server).await?;
//! # Ok(())
//! # }
//! ```

use anyhow::Result;
use parking_lot::RwLock;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Debug, Clone)]
pub struct ShutdownConfig {
    /// How long in-flight requests may run after shutdown starts
    pub drain_timeout: Duration,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            drain_timeout: Duration::from_secs(30),
        }
    }
}

impl ShutdownConfig {
    pub fn with_drain_timeout_secs(self, timeout_secs: u64) -> Self {
        self.with_drain_timeout(Duration::from_secs(timeout_secs))
    }

    pub fn with_drain_timeout(mut self, drain_timeout: Duration) -> Self {
        self.drain_timeout = drain_timeout;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownPhase {
    Running,
    /// Stopped accepting, waiting for in-flight requests
    Draining,
    Complete,
    /// Drain timeout hit; remaining connections dropped
    Forced,
}

impl std::fmt::Display for ShutdownPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShutdownPhase::Running => write!(f, "running"),
            ShutdownPhase::Draining => write!(f, "draining"),
            ShutdownPhase::Complete => write!(f, "complete"),
            ShutdownPhase::Forced => write!(f, "forced"),
        }
    }
}

pub struct ShutdownCoordinator {
    config: ShutdownConfig,
    phase: RwLock<ShutdownPhase>,
    shutdown_token: CancellationToken,
}

impl ShutdownCoordinator {
    pub fn new(config: ShutdownConfig) -> Self {
        Self::with_token(config, CancellationToken::new())
    }

    /// Coordinator driving an existing token, so other holders of the token
    /// observe shutdown too.
    pub fn with_token(config: ShutdownConfig, shutdown_token: CancellationToken) -> Self {
        Self {
            config,
            phase: RwLock::new(ShutdownPhase::Running),
            shutdown_token,
        }
    }

    /// Token cancelled when shutdown begins.
    pub fn token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    pub fn phase(&self) -> ShutdownPhase {
        *self.phase.read()
    }

    pub fn is_shutdown_initiated(&self) -> bool {
        self.shutdown_token.is_cancelled()
    }

    /// Starts shutdown without waiting for a signal.
    pub fn initiate(&self) {
        self.shutdown_token.cancel();
    }

    /// Spawns a task that initiates shutdown on the first SIGINT or SIGTERM.
    pub fn listen_for_signals(self: Arc<Self>) {
        tokio::spawn(async move {
            wait_for_signal().await;
            self.initiate();
        });
    }

    /// Runs `server` to completion, bounding it by the drain timeout once
    /// shutdown has been initiated.
    pub async fn drive<F, E>(&self, server: F) -> Result<()>
    where
        F: Future<Output = std::result::Result<(), E>>,
        E: Into<anyhow::Error>,
    {
        tokio::pin!(server);

        tokio::select! {
            biased;
            _ = self.shutdown_token.cancelled() => {}
            result = &mut server => return result.map_err(Into::into),
        }

        *self.phase.write() = ShutdownPhase::Draining;
        info!(
            timeout_secs = self.config.drain_timeout.as_secs(),
            "stopped accepting connections, draining in-flight requests"
        );

        match timeout(self.config.drain_timeout, &mut server).await {
            Ok(result) => {
                *self.phase.write() = ShutdownPhase::Complete;
                info!("graceful shutdown completed");
                result.map_err(Into::into)
            }
            Err(_) => {
                *self.phase.write() = ShutdownPhase::Forced;
                warn!(
                    timeout_secs = self.config.drain_timeout.as_secs(),
                    "drain timeout exceeded, dropping remaining connections"
                );
                Ok(())
            }
        }
    }
}

/// Resolves on SIGINT (Ctrl+C) or, on unix, SIGTERM.
pub async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!(signal = "SIGINT", "shutdown requested");
        },
        _ = terminate => {
            info!(signal = "SIGTERM", "shutdown requested");
        },
    }
}
