//! Liveness and readiness probes served at `/health` and `/ready`.

use crate::state::AppState;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

pub const LIVENESS_ROUTE: &str = "/health";
pub const READINESS_ROUTE: &str = "/ready";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    Healthy,
    Unhealthy,
}

impl ProbeStatus {
    fn http_status(self) -> StatusCode {
        match self {
            ProbeStatus::Healthy => StatusCode::OK,
            ProbeStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Liveness {
    pub status: ProbeStatus,
    /// Unix seconds
    pub timestamp: i64,
    pub version: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Readiness {
    pub ready: bool,
    pub status: ProbeStatus,
    pub timestamp: i64,
    pub stored_receipts: usize,
    pub uptime_secs: u64,
}

impl Liveness {
    pub fn probe() -> Self {
        Self {
            status: ProbeStatus::Healthy,
            timestamp: Utc::now().timestamp(),
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

impl Readiness {
    /// Ready until shutdown begins; the store itself lives in process
    /// memory and is always available.
    pub fn probe(state: &AppState) -> Self {
        let ready = !state.is_shutting_down();
        Self {
            ready,
            status: if ready {
                ProbeStatus::Healthy
            } else {
                ProbeStatus::Unhealthy
            },
            timestamp: Utc::now().timestamp(),
            stored_receipts: state.store().len(),
            uptime_secs: state.uptime().as_secs(),
        }
    }
}

impl IntoResponse for Liveness {
    fn into_response(self) -> Response {
        (self.status.http_status(), Json(self)).into_response()
    }
}

impl IntoResponse for Readiness {
    fn into_response(self) -> Response {
        (self.status.http_status(), Json(self)).into_response()
    }
}

/// Probe routes, to be merged into the main router.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(LIVENESS_ROUTE, get(liveness))
        .route(READINESS_ROUTE, get(readiness))
}

async fn liveness() -> Liveness {
    Liveness::probe()
}

async fn readiness(State(state): State<Arc<AppState>>) -> Readiness {
    Readiness::probe(&state)
}
