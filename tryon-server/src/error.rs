//! HTTP error envelope.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::error;
use tryon_core::ProxyError;

/// Body of every failed proxy response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Handler error. Always rendered as HTTP 500 with an [`ErrorResponse`] body.
#[derive(Debug)]
pub struct AppError(pub ProxyError);

impl From<ProxyError> for AppError {
    fn from(err: ProxyError) -> Self {
        Self(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = self.0.to_string();
        error!("Edge function error: {}", message);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse { error: message }),
        )
            .into_response()
    }
}
