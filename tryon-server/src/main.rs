//! tryon-server: HTTP front for image generation.
//!
//! Configuration comes from the environment (a `.env` file is honoured); see
//! [`tryon_server::config`] for the variables.

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tryon_server::{build_router, credentials, AppState, GeminiClient, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tryon_server=debug,tryon_core=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env().context("invalid configuration")?;

    let gemini = GeminiClient::new(config.gemini.clone()).context("failed to build HTTP client")?;
    tracing::info!(
        "Upstream {} ({} attempts, up to {}ms backoff, {}s per attempt)",
        gemini.endpoint(),
        config.gemini.retry.max_attempts,
        gemini.worst_case_backoff().as_millis(),
        config.gemini.timeout.as_secs()
    );

    let credentials = credentials::connect(&config.credentials)
        .await
        .context("failed to open credential store")?;

    let app = build_router(AppState::new(gemini, credentials), config.max_body_bytes);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!("tryon-server listening on {}", config.bind_addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
