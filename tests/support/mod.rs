#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Method, Request, Response, StatusCode, header},
};
use http_body_util::BodyExt;
use receipt_processor::{AppState, ServerConfig, router};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub const TARGET_RECEIPT: &str = include_str!("../fixtures/receipts/target.json");
pub const CORNER_MARKET_RECEIPT: &str = include_str!("../fixtures/receipts/corner_market.json");
pub const MORNING_RECEIPT: &str = include_str!("../fixtures/receipts/morning.json");
pub const SIMPLE_RECEIPT: &str = include_str!("../fixtures/receipts/simple.json");

/// Router over a fresh, isolated store.
pub struct TestApp {
    pub state: Arc<AppState>,
    pub router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(ServerConfig::default())
    }

    pub fn with_config(config: ServerConfig) -> Self {
        let state = Arc::new(AppState::new(Arc::new(config)));
        let router = router(state.clone());
        Self { state, router }
    }

    pub async fn request(&self, method: Method, uri: &str, body: Body) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body)
            .expect("build request");
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        TestResponse::read(response).await
    }

    pub async fn process(&self, body: impl Into<String>) -> TestResponse {
        self.request(Method::POST, "/receipts/process", Body::from(body.into()))
            .await
    }

    pub async fn points(&self, id: &str) -> TestResponse {
        self.request(
            Method::GET,
            &format!("/receipts/{id}/points"),
            Body::empty(),
        )
        .await
    }

    /// Submits a receipt that must be accepted and returns its id.
    pub async fn submit_ok(&self, body: impl Into<String>) -> String {
        let response = self.process(body).await;
        assert_eq!(response.status, StatusCode::OK, "body: {}", response.text());
        response.json()["id"]
            .as_str()
            .expect("id is a string")
            .to_string()
    }

    /// Fetches points for an id that must exist.
    pub async fn points_ok(&self, id: &str) -> i64 {
        let response = self.points(id).await;
        assert_eq!(response.status, StatusCode::OK, "body: {}", response.text());
        response.json()["points"].as_i64().expect("points is an integer")
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl TestResponse {
    async fn read(response: Response<Body>) -> Self {
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response
            .into_body()
            .collect()
            .await
            .expect("collect body")
            .to_bytes()
            .to_vec();
        Self {
            status,
            content_type,
            body,
        }
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("response body is JSON")
    }
}

/// A receipt body with one field replaced.
pub fn receipt_with(base: &str, field: &str, value: Value) -> String {
    let mut receipt: Value = serde_json::from_str(base).expect("fixture is JSON");
    receipt[field] = value;
    receipt.to_string()
}
