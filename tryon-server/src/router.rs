//! Router construction for the generation proxy.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use http::header::{
    HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN,
};
use tower::ServiceBuilder;
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};

use crate::credentials::CredentialStore;
use crate::gemini::GeminiClient;
use crate::handlers;

/// Path the browser app calls
pub const FUNCTION_PATH: &str = "/functions/v1/gemini-api";
/// Same handler under a plain API path
pub const GENERATE_PATH: &str = "/api/generate";

pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_METHODS: &str = "POST, OPTIONS";
pub const ALLOW_HEADERS: &str = "Content-Type, Authorization, X-Client-Info, Apikey";

#[derive(Clone)]
pub struct AppState {
    pub gemini: Arc<GeminiClient>,
    pub credentials: Arc<dyn CredentialStore>,
}

impl AppState {
    pub fn new(gemini: GeminiClient, credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            gemini: Arc::new(gemini),
            credentials,
        }
    }
}

/// Build the full axum router with all routes and layers.
///
/// CORS headers are set on every response, errors and preflights included.
pub fn build_router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route(
            FUNCTION_PATH,
            post(handlers::generate).options(handlers::preflight),
        )
        .route(
            GENERATE_PATH,
            post(handlers::generate).options(handlers::preflight),
        )
        .route("/health", get(handlers::health))
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(SetResponseHeaderLayer::overriding(
                    ACCESS_CONTROL_ALLOW_ORIGIN,
                    HeaderValue::from_static(ALLOW_ORIGIN),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    ACCESS_CONTROL_ALLOW_METHODS,
                    HeaderValue::from_static(ALLOW_METHODS),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    ACCESS_CONTROL_ALLOW_HEADERS,
                    HeaderValue::from_static(ALLOW_HEADERS),
                )),
        )
}
