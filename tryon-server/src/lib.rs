//! Generation proxy for the virtual try-on app.
//!
//! Accepts one JSON request per generation from the browser, looks up the
//! upstream API key, and forwards the images and instruction to Gemini with
//! bounded retry. Every response, success or failure, carries permissive CORS
//! headers; every failure is a `{"error": ...}` envelope with HTTP 500.

pub mod config;
pub mod credentials;
pub mod error;
pub mod gemini;
pub mod handlers;
pub mod router;

pub use config::{ConfigError, CredentialSource, GeminiConfig, RetryPolicy, ServerConfig};
pub use credentials::{CredentialError, CredentialStore};
pub use error::AppError;
pub use gemini::GeminiClient;
pub use router::{build_router, AppState};
