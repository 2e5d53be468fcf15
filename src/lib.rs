pub mod config;
pub mod error;
pub mod health;
pub mod id;
pub mod logging;
pub mod metrics;
pub mod model;
pub mod scoring;
pub mod server;
pub mod shutdown;
pub mod state;
pub mod store;
pub mod validation;

pub use config::{CliArgs, ServerConfig};
pub use error::ReceiptError;
pub use logging::{LoggingConfig, init_logging, shutdown_telemetry};
pub use model::{Item, PointsResponse, ProcessResponse, Receipt, decode_receipt};
pub use server::router;
pub use shutdown::{ShutdownConfig, ShutdownCoordinator};
pub use state::AppState;
pub use store::PointsStore;

use anyhow::{Context, Result};
use std::future::IntoFuture;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Binds the configured address and serves until SIGINT or SIGTERM.
pub async fn run_server(config: ServerConfig) -> Result<()> {
    let config = Arc::new(config);
    let state = Arc::new(AppState::new(config.clone()));

    let listener = TcpListener::bind(config.bind_address)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_address))?;

    serve(listener, state).await
}

/// Serves the receipt routes on an already-bound listener.
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> Result<()> {
    let config = state.config();
    let coordinator = Arc::new(ShutdownCoordinator::with_token(
        ShutdownConfig::default().with_drain_timeout_secs(config.shutdown_timeout_secs),
        state.shutdown_token(),
    ));
    coordinator.clone().listen_for_signals();

    let actual_addr = listener.local_addr()?;
    tracing::info!(
        bind = %actual_addr,
        max_body_bytes = config.max_body_bytes,
        "receipt processor listening"
    );

    let token = coordinator.token();
    let server = axum::serve(listener, router(state.clone()))
        .with_graceful_shutdown(async move { token.cancelled().await })
        .into_future();

    let result = coordinator.drive(server).await;

    tracing::info!(
        discarded_receipts = state.store().len(),
        phase = %coordinator.phase(),
        "server stopped"
    );

    result
}
