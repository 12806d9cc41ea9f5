//! Route handlers.

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info};
use tryon_core::{GenerateBody, ProxyError};

use crate::credentials::GEMINI_SERVICE;
use crate::error::AppError;
use crate::router::AppState;

/// Successful generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    #[serde(rename = "imageUrl")]
    pub image_url: String,
}

/// POST /functions/v1/gemini-api, POST /api/generate
///
/// The body is validated before the key lookup, so a malformed request never
/// reaches the credential store or the upstream.
pub async fn generate(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<GenerateResponse>, AppError> {
    let body = body.map_err(|e| ProxyError::InvalidRequest(e.body_text()))?;
    let request = GenerateBody::from_json(&body)?.validate()?;
    info!("Action: {}", request.action());

    let api_key = state
        .credentials
        .api_key(GEMINI_SERVICE)
        .await
        .map_err(|e| {
            error!("API key lookup: {}", e);
            ProxyError::CredentialUnavailable
        })?;

    let image = state.gemini.generate(&api_key, &request).await?;
    info!("Generated {} image", image.mime_type());

    Ok(Json(GenerateResponse {
        image_url: image.to_string(),
    }))
}

/// OPTIONS on the generation routes. CORS headers come from the router layers.
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
