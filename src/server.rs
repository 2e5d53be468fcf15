//! HTTP routes.
//!
//! `POST /receipts/process` validates, scores and stores a receipt.
//! `GET /receipts/{id}/points` returns the stored points. Any other method or
//! path, `HEAD` included, is answered with a bare 404, never a 405.

use crate::error::{ROUTE_MISS_MESSAGE, ReceiptError, plain_text};
use crate::health;
use crate::id;
use crate::metrics::{METRICS, RequestTimer};
use crate::model::{PointsResponse, ProcessResponse, decode_receipt};
use crate::scoring;
use crate::state::AppState;
use crate::store::PointsStore;
use crate::validation::validate_receipt;
use axum::{
    Json, Router,
    body::Bytes,
    extract::{
        DefaultBodyLimit, Path, State,
        rejection::{BytesRejection, PathRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

pub const PROCESS_ROUTE: &str = "/receipts/process";
pub const POINTS_ROUTE: &str = "/receipts/{id}/points";
pub const METRICS_ROUTE: &str = "/metrics";

/// Builds the full application router around `state`.
pub fn router(state: Arc<AppState>) -> Router {
    let max_body_bytes = state.config().max_body_bytes;

    Router::new()
        .route(PROCESS_ROUTE, post(process_receipt).fallback(route_miss))
        .route(
            POINTS_ROUTE,
            get(get_points).head(route_miss).fallback(route_miss),
        )
        .route(METRICS_ROUTE, get(metrics_handler))
        .merge(health::routes())
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .fallback(route_miss)
        .with_state(state)
}

#[instrument(name = "process_receipt", skip_all)]
pub async fn process_receipt(
    State(state): State<Arc<AppState>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<ProcessResponse>, ReceiptError> {
    let timer = RequestTimer::start(PROCESS_ROUTE);
    let result = submit(&state, body);
    timer.finish(outcome(&result));
    result.map(Json)
}

#[instrument(name = "get_points", skip_all)]
pub async fn get_points(
    State(state): State<Arc<AppState>>,
    id: Result<Path<String>, PathRejection>,
) -> Response {
    let Ok(Path(id)) = id else {
        return route_miss().await.into_response();
    };
    if id.is_empty() {
        return route_miss().await.into_response();
    }

    let timer = RequestTimer::start(POINTS_ROUTE);
    let result = lookup(state.store(), id);
    timer.finish(outcome(&result));
    result.map(Json).into_response()
}

/// Generic 404 for unmatched paths and methods.
pub async fn route_miss() -> Response {
    plain_text(StatusCode::NOT_FOUND, ROUTE_MISS_MESSAGE)
}

async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        [(
            header::CONTENT_TYPE,
            "application/openmetrics-text; version=1.0.0; charset=utf-8",
        )],
        METRICS.encode_with_stored(state.store().len()),
    )
}

fn submit(
    state: &AppState,
    body: Result<Bytes, BytesRejection>,
) -> Result<ProcessResponse, ReceiptError> {
    let body = body.map_err(|rejection| {
        METRICS.record_rejected("decode");
        debug!(error = %rejection, "failed to read receipt body");
        ReceiptError::InvalidReceipt(rejection.body_text())
    })?;

    let receipt = decode_receipt(&body).map_err(|error| {
        METRICS.record_rejected("decode");
        debug!(%error, "failed to decode receipt");
        ReceiptError::from(error)
    })?;

    if let Err(error) = validate_receipt(&receipt) {
        METRICS.record_rejected("validation");
        debug!(%error, retailer = %receipt.retailer, "receipt failed validation");
        return Err(error.into());
    }

    let points = scoring::score(&receipt);
    let id = store_points(state.store(), points);
    METRICS.record_processed();
    info!(receipt.id = %id, points, items = receipt.items.len(), "receipt processed");

    Ok(ProcessResponse { id })
}

/// Stores `points` under a freshly generated identifier, drawing again if the
/// identifier is already taken.
fn store_points(store: &PointsStore, points: i64) -> String {
    loop {
        let id = id::new_id();
        if store.put(&id, points) {
            return id;
        }
        warn!(receipt.id = %id, "generated identifier already in use, drawing another");
    }
}

fn lookup(store: &PointsStore, id: String) -> Result<PointsResponse, ReceiptError> {
    match store.get(&id) {
        Some(points) => {
            METRICS.record_lookup(true);
            debug!(receipt.id = %id, points, "points found");
            Ok(PointsResponse { points })
        }
        None => {
            METRICS.record_lookup(false);
            debug!(receipt.id = %id, "no receipt for id");
            Err(ReceiptError::NotFound(id))
        }
    }
}

fn outcome<T>(result: &Result<T, ReceiptError>) -> &'static str {
    match result {
        Ok(_) => "success",
        Err(error) => error.category(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_points_returns_retrievable_id() {
        let store = PointsStore::new();
        let id = store_points(&store, 42);
        assert_eq!(store.get(&id), Some(42));
    }

    #[test]
    fn lookup_reports_missing_ids() {
        let store = PointsStore::new();
        store.put("known", 7);

        assert_eq!(lookup(&store, "known".into()).unwrap(), PointsResponse { points: 7 });
        assert!(matches!(
            lookup(&store, "unknown".into()),
            Err(ReceiptError::NotFound(id)) if id == "unknown"
        ));
    }

    #[test]
    fn submit_rejects_malformed_json_without_storing() {
        let state = AppState::default();
        let result = submit(&state, Ok(Bytes::from_static(b"{\"retailer\": ")));
        assert!(matches!(result, Err(ReceiptError::InvalidReceipt(_))));
        assert!(state.store().is_empty());
    }

    #[test]
    fn submit_stores_valid_receipt() {
        let state = AppState::default();
        let body = serde_json::json!({
            "retailer": "Target",
            "purchaseDate": "2022-01-01",
            "purchaseTime": "13:01",
            "items": [{"shortDescription": "Mountain Dew 12PK", "price": "6.49"}],
            "total": "6.49"
        });
        let response = submit(&state, Ok(Bytes::from(body.to_string()))).unwrap();
        assert_eq!(state.store().get(&response.id), Some(12));
    }
}
