//! Client-facing errors for the receipt routes.
//!
//! Responses carry fixed plain-text messages. The reason attached to
//! [`ReceiptError::InvalidReceipt`] is for logs only and never reaches the
//! response body.

use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use thiserror::Error;

pub const INVALID_RECEIPT_MESSAGE: &str = "The receipt is invalid. Please verify input.";
pub const RECEIPT_NOT_FOUND_MESSAGE: &str = "No receipt found for that ID.";
pub const ROUTE_MISS_MESSAGE: &str = "404 page not found";

#[derive(Debug, Error)]
pub enum ReceiptError {
    /// Body could not be decoded, or a validation rule failed.
    #[error("invalid receipt: {0}")]
    InvalidReceipt(String),

    #[error("no receipt stored under id '{0}'")]
    NotFound(String),
}

impl ReceiptError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ReceiptError::InvalidReceipt(_) => StatusCode::BAD_REQUEST,
            ReceiptError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    /// Text sent to the client.
    pub fn public_message(&self) -> &'static str {
        match self {
            ReceiptError::InvalidReceipt(_) => INVALID_RECEIPT_MESSAGE,
            ReceiptError::NotFound(_) => RECEIPT_NOT_FOUND_MESSAGE,
        }
    }

    /// Stable label for metrics.
    pub fn category(&self) -> &'static str {
        match self {
            ReceiptError::InvalidReceipt(_) => "invalid_receipt",
            ReceiptError::NotFound(_) => "not_found",
        }
    }
}

impl From<serde_json::Error> for ReceiptError {
    fn from(error: serde_json::Error) -> Self {
        ReceiptError::InvalidReceipt(format!("malformed JSON: {error}"))
    }
}

impl From<crate::validation::ValidationError> for ReceiptError {
    fn from(error: crate::validation::ValidationError) -> Self {
        ReceiptError::InvalidReceipt(error.to_string())
    }
}

impl IntoResponse for ReceiptError {
    fn into_response(self) -> Response {
        plain_text(self.status_code(), self.public_message())
    }
}

/// Plain-text error body: `message` plus a trailing newline.
pub fn plain_text(status: StatusCode, message: &str) -> Response {
    (
        status,
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
        ],
        format!("{message}\n"),
    )
        .into_response()
}
