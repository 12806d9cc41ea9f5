//! Upstream API key lookup.
//!
//! The key is fetched once per request and never cached or mutated by the
//! proxy. Backends are pluggable behind [`CredentialStore`]: an environment
//! variable, the `api_keys` table through Supabase's REST interface, or the
//! same table over a direct Postgres connection (`database` feature).

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::CredentialSource;

/// `service_name` of the generation API's row in `api_keys`
pub const GEMINI_SERVICE: &str = "gemini";

#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("No API key stored for service '{0}'")]
    NotFound(String),

    #[error("API key lookup failed: {0}")]
    Lookup(String),

    #[error("Credential source unavailable: {0}")]
    Unsupported(String),
}

/// Resolves the secret for a named upstream service.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn api_key(&self, service: &str) -> Result<String, CredentialError>;
}

/// Build the store selected by configuration.
pub async fn connect(source: &CredentialSource) -> Result<Arc<dyn CredentialStore>, CredentialError> {
    match source {
        CredentialSource::Env { var } => {
            info!("Reading upstream API key from ${}", var);
            Ok(Arc::new(EnvCredentialStore::new(var.clone())))
        }
        CredentialSource::Supabase {
            url,
            service_role_key,
        } => {
            info!("Reading upstream API key from Supabase table api_keys at {}", url);
            Ok(Arc::new(SupabaseCredentialStore::new(
                reqwest::Client::new(),
                url.clone(),
                service_role_key.clone(),
            )))
        }
        #[cfg(feature = "database")]
        CredentialSource::Postgres { database_url } => {
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await
                .map_err(|e| CredentialError::Lookup(e.to_string()))?;
            info!("Reading upstream API key from Postgres table api_keys");
            Ok(Arc::new(PgCredentialStore::new(pool)))
        }
        #[cfg(not(feature = "database"))]
        CredentialSource::Postgres { .. } => Err(CredentialError::Unsupported(
            "postgres credential source requires the `database` feature".to_string(),
        )),
    }
}

fn non_empty(service: &str, key: Option<String>) -> Result<String, CredentialError> {
    key.filter(|k| !k.trim().is_empty())
        .ok_or_else(|| CredentialError::NotFound(service.to_string()))
}

// ============================================================================
// Environment
// ============================================================================

/// Reads the key from one environment variable, whatever the service name.
#[derive(Debug, Clone)]
pub struct EnvCredentialStore {
    var: String,
}

impl EnvCredentialStore {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

#[async_trait]
impl CredentialStore for EnvCredentialStore {
    async fn api_key(&self, service: &str) -> Result<String, CredentialError> {
        non_empty(service, std::env::var(&self.var).ok())
    }
}

// ============================================================================
// Supabase (PostgREST)
// ============================================================================

#[derive(Debug, Deserialize)]
struct ApiKeyRow {
    api_key: Option<String>,
}

/// Queries `api_keys` through `{url}/rest/v1`, authenticated with the service role key.
#[derive(Debug, Clone)]
pub struct SupabaseCredentialStore {
    client: reqwest::Client,
    url: String,
    service_role_key: String,
}

impl SupabaseCredentialStore {
    pub fn new(client: reqwest::Client, url: String, service_role_key: String) -> Self {
        Self {
            client,
            url,
            service_role_key,
        }
    }
}

#[async_trait]
impl CredentialStore for SupabaseCredentialStore {
    async fn api_key(&self, service: &str) -> Result<String, CredentialError> {
        let endpoint = format!("{}/rest/v1/api_keys", self.url);
        let service_filter = format!("eq.{}", service);
        debug!("Looking up API key for '{}' at {}", service, endpoint);

        let response = self
            .client
            .get(&endpoint)
            .query(&[
                ("select", "api_key"),
                ("service_name", service_filter.as_str()),
                ("limit", "1"),
            ])
            .header("apikey", &self.service_role_key)
            .bearer_auth(&self.service_role_key)
            .send()
            .await
            .map_err(|e| CredentialError::Lookup(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CredentialError::Lookup(format!("HTTP {}: {}", status, body)));
        }

        let rows: Vec<ApiKeyRow> = response
            .json()
            .await
            .map_err(|e| CredentialError::Lookup(e.to_string()))?;
        non_empty(service, rows.into_iter().next().and_then(|row| row.api_key))
    }
}

// ============================================================================
// Postgres
// ============================================================================

/// Queries `api_keys` directly.
#[cfg(feature = "database")]
#[derive(Debug, Clone)]
pub struct PgCredentialStore {
    pool: sqlx::PgPool,
}

#[cfg(feature = "database")]
impl PgCredentialStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[cfg(feature = "database")]
#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn api_key(&self, service: &str) -> Result<String, CredentialError> {
        let key: Option<Option<String>> = sqlx::query_scalar(
            "SELECT api_key FROM api_keys WHERE service_name = $1 LIMIT 1",
        )
        .bind(service)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| CredentialError::Lookup(e.to_string()))?;
        non_empty(service, key.flatten())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use axum::extract::{Query, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::{IntoResponse, Response};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;

    #[tokio::test]
    async fn env_store_reads_variable() {
        std::env::set_var("TRYON_TEST_KEY_PRESENT", "secret-123");
        let store = EnvCredentialStore::new("TRYON_TEST_KEY_PRESENT");
        assert_eq!(store.api_key(GEMINI_SERVICE).await.unwrap(), "secret-123");
    }

    #[tokio::test]
    async fn env_store_missing_or_blank_is_not_found() {
        let store = EnvCredentialStore::new("TRYON_TEST_KEY_NEVER_SET");
        assert!(matches!(
            store.api_key(GEMINI_SERVICE).await,
            Err(CredentialError::NotFound(service)) if service == "gemini"
        ));

        std::env::set_var("TRYON_TEST_KEY_BLANK", "  ");
        let store = EnvCredentialStore::new("TRYON_TEST_KEY_BLANK");
        assert!(store.api_key(GEMINI_SERVICE).await.is_err());
    }

    type Seen = Arc<Mutex<Option<(HashMap<String, String>, Option<String>, Option<String>)>>>;

    /// PostgREST stand-in serving `/rest/v1/api_keys`, keyed on the `service_name` filter.
    async fn spawn_postgrest() -> (String, Seen) {
        async fn api_keys(
            State(seen): State<Seen>,
            Query(query): Query<HashMap<String, String>>,
            headers: HeaderMap,
        ) -> Response {
            let header = |name: &str| {
                headers
                    .get(name)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string)
            };
            let filter = query.get("service_name").cloned().unwrap_or_default();
            *seen.lock().unwrap() = Some((query, header("apikey"), header("authorization")));

            match filter.as_str() {
                "eq.gemini" => Json(json!([{ "api_key": "k1" }])).into_response(),
                "eq.nullkey" => Json(json!([{ "api_key": null }])).into_response(),
                "eq.broken" => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "relation \"api_keys\" does not exist",
                )
                    .into_response(),
                _ => Json(json!([])).into_response(),
            }
        }

        let seen: Seen = Arc::default();
        let app = Router::new()
            .route("/rest/v1/api_keys", get(api_keys))
            .with_state(Arc::clone(&seen));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}", addr), seen)
    }

    async fn supabase_store(url: String) -> Arc<dyn CredentialStore> {
        connect(&CredentialSource::Supabase {
            url,
            service_role_key: "srk".to_string(),
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn supabase_store_queries_api_keys_with_service_role() {
        let (url, seen) = spawn_postgrest().await;
        let store = supabase_store(url).await;

        assert_eq!(store.api_key(GEMINI_SERVICE).await.unwrap(), "k1");

        let (query, apikey, auth) = seen.lock().unwrap().clone().unwrap();
        assert_eq!(query.get("select").map(String::as_str), Some("api_key"));
        assert_eq!(query.get("service_name").map(String::as_str), Some("eq.gemini"));
        assert_eq!(query.get("limit").map(String::as_str), Some("1"));
        assert_eq!(apikey.as_deref(), Some("srk"));
        assert_eq!(auth.as_deref(), Some("Bearer srk"));
    }

    #[tokio::test]
    async fn supabase_store_without_usable_row_is_not_found() {
        let (url, _) = spawn_postgrest().await;
        let store = supabase_store(url).await;

        assert!(matches!(
            store.api_key("other").await,
            Err(CredentialError::NotFound(service)) if service == "other"
        ));
        assert!(matches!(
            store.api_key("nullkey").await,
            Err(CredentialError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn supabase_store_http_failure_is_lookup_error() {
        let (url, _) = spawn_postgrest().await;
        let store = supabase_store(url).await;

        match store.api_key("broken").await {
            Err(CredentialError::Lookup(detail)) => {
                assert!(detail.contains("500"), "detail: {}", detail);
                assert!(detail.contains("does not exist"), "detail: {}", detail);
            }
            other => panic!("expected lookup error, got {:?}", other),
        }
    }

    #[cfg(not(feature = "database"))]
    #[tokio::test]
    async fn postgres_source_needs_feature() {
        let source = CredentialSource::Postgres {
            database_url: "postgresql:///tryon".to_string(),
        };
        assert!(matches!(
            connect(&source).await,
            Err(CredentialError::Unsupported(_))
        ));
    }

    #[cfg(feature = "database")]
    #[tokio::test]
    #[ignore = "Requires DATABASE_URL with an api_keys table"]
    async fn postgres_store_reads_table() {
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let store = connect(&CredentialSource::Postgres { database_url })
            .await
            .unwrap();
        assert!(!store.api_key(GEMINI_SERVICE).await.unwrap().is_empty());
    }
}
