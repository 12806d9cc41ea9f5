//! Google Gemini client for image generation.
//!
//! One call per proxy request: build the multimodal payload, POST it with
//! bounded retry, then normalize the body into a single image or a terminal
//! error. Only transport failures and non-success statuses are retried; a
//! success status is final even when the body carries a block or no image.

pub mod wire;

use std::time::Duration;

use reqwest::{Client, Response};
use tracing::{debug, error, info, warn};
use tryon_core::{DataUrl, GenerationRequest, ProxyError, ProxyResult};

use crate::config::GeminiConfig;
use wire::{GenerateContentRequest, GenerateContentResponse, UpstreamOutcome};

/// Gemini API client
#[derive(Debug, Clone)]
pub struct GeminiClient {
    config: GeminiConfig,
    client: Client,
}

impl GeminiClient {
    /// Create a client whose every attempt is bounded by `config.timeout`.
    pub fn new(config: GeminiConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    /// `POST` target, without the key.
    pub fn endpoint(&self) -> String {
        format!("{}/{}:generateContent", self.config.base_url, self.config.model)
    }

    /// Run one generation and return the produced image.
    pub async fn generate(
        &self,
        api_key: &str,
        request: &GenerationRequest,
    ) -> ProxyResult<DataUrl> {
        let payload = GenerateContentRequest::for_request(request);
        info!(
            "[Gemini Request] Action: {}, parts: {} {:?}",
            request.action(),
            payload.part_count(),
            payload.part_kinds()
        );

        let body = self.send_with_retry(api_key, &payload).await?;
        let outcome = GenerateContentResponse::parse(&body)
            .inspect_err(|e| error!("{}", e))?
            .normalize();
        debug!("[Gemini Response] {}", describe(&outcome));

        outcome.into_result()
    }

    async fn send_with_retry(
        &self,
        api_key: &str,
        payload: &GenerateContentRequest,
    ) -> ProxyResult<String> {
        let retry = self.config.retry;
        let endpoint = self.endpoint();
        let mut last_error = String::new();

        for attempt in 1..=retry.max_attempts {
            match self.send_once(&endpoint, api_key, payload).await {
                Ok(response) if response.status().is_success() => {
                    info!("[Gemini Response] Attempt {}: success", attempt);
                    // A success status is final, even if the body never arrives.
                    return response.text().await.map_err(|e| {
                        let e = e.without_url();
                        error!("[Gemini Error] Attempt {}: body read failed: {}", attempt, e);
                        ProxyError::MalformedResponse(e.to_string())
                    });
                }
                Ok(response) => {
                    let status = response.status();
                    let body = response
                        .text()
                        .await
                        .unwrap_or_else(|e| e.without_url().to_string());
                    error!("[Gemini Error] Attempt {}: HTTP {} {}", attempt, status, body);
                    last_error = body;
                }
                Err(e) => {
                    // The request URL carries the key.
                    let e = e.without_url();
                    error!("[Gemini Error] Attempt {}: {}", attempt, e);
                    last_error = e.to_string();
                }
            }

            if attempt < retry.max_attempts {
                let delay = retry.delay_after(attempt);
                warn!("[Retry] Waiting {}ms before retry", delay.as_millis());
                tokio::time::sleep(delay).await;
            }
        }

        Err(ProxyError::Upstream {
            attempts: retry.max_attempts,
            body: last_error,
        })
    }

    async fn send_once(
        &self,
        endpoint: &str,
        api_key: &str,
        payload: &GenerateContentRequest,
    ) -> Result<Response, reqwest::Error> {
        self.client
            .post(endpoint)
            .query(&[("key", api_key)])
            .json(payload)
            .send()
            .await
    }

    /// Longest total time the retry schedule can spend sleeping.
    pub fn worst_case_backoff(&self) -> Duration {
        self.config.retry.total_backoff()
    }
}

/// One-line summary of an outcome, without the image payload.
fn describe(outcome: &UpstreamOutcome) -> String {
    match outcome {
        UpstreamOutcome::Image(image) => format!(
            "image {} ({} base64 chars)",
            image.mime_type(),
            image.payload().len()
        ),
        UpstreamOutcome::Blocked { reason, .. } => format!("blocked: {}", reason),
        UpstreamOutcome::Stopped { reason } => format!("stopped: {}", reason),
        UpstreamOutcome::NoImage => "no image".to_string(),
    }
}
