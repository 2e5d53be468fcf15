use crate::config::ServerConfig;
use crate::store::PointsStore;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Shared state handed to every route.
///
/// Each `AppState` owns its own store, so tests can build as many isolated
/// routers as they need.
pub struct AppState {
    config: Arc<ServerConfig>,
    store: PointsStore,
    started_at: Instant,
    shutdown: CancellationToken,
}

impl AppState {
    pub fn new(config: Arc<ServerConfig>) -> Self {
        Self::with_store(config, PointsStore::new())
    }

    pub fn with_store(config: Arc<ServerConfig>, store: PointsStore) -> Self {
        Self {
            config,
            store,
            started_at: Instant::now(),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> Arc<ServerConfig> {
        self.config.clone()
    }

    pub fn store(&self) -> &PointsStore {
        &self.store
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Cancelled once the server starts shutting down.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Arc::new(ServerConfig::default()))
    }
}
