//! Server configuration, read from environment variables.
//!
//! | Variable                      | Default                                                  |
//! |-------------------------------|----------------------------------------------------------|
//! | `TRYON_BIND_ADDR`             | `0.0.0.0:3000`                                           |
//! | `TRYON_MAX_BODY_BYTES`        | `33554432` (32 MiB, base64 photos are large)             |
//! | `GEMINI_BASE_URL`             | `https://generativelanguage.googleapis.com/v1beta/models` |
//! | `GEMINI_MODEL`                | `gemini-2.0-flash-exp`                                   |
//! | `TRYON_UPSTREAM_TIMEOUT_SECS` | `120` (per attempt)                                      |
//! | `TRYON_MAX_ATTEMPTS`          | `3`                                                      |
//! | `TRYON_BACKOFF_MS`            | `1000`                                                   |
//! | `TRYON_CREDENTIAL_SOURCE`     | `env` (`env`, `supabase` or `postgres`)                  |
//!
//! The credential source pulls in its own variables: `GEMINI_API_KEY` for
//! `env`, `SUPABASE_URL` + `SUPABASE_SERVICE_ROLE_KEY` for `supabase`, and
//! `DATABASE_URL` for `postgres`.

use std::time::Duration;

use thiserror::Error;
use tracing::warn;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_MAX_BODY_BYTES: usize = 32 * 1024 * 1024;
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash-exp";
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BACKOFF_MS: u64 = 1000;
pub const DEFAULT_API_KEY_VAR: &str = "GEMINI_API_KEY";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("Unknown credential source '{0}', expected env, supabase or postgres")]
    UnknownCredentialSource(String),
}

/// Bounded retry with linear backoff.
///
/// After failed attempt `n` (1-based) the client waits `n * backoff` before
/// trying again. No wait follows the final attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: Duration::from_millis(DEFAULT_BACKOFF_MS),
        }
    }
}

impl RetryPolicy {
    /// Delay before the attempt that follows failed attempt `attempt`.
    /// Saturates at `Duration::MAX` instead of overflowing.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff.checked_mul(attempt).unwrap_or(Duration::MAX)
    }

    /// Longest total time the schedule can spend sleeping, saturating.
    pub fn total_backoff(&self) -> Duration {
        if self.backoff.is_zero() {
            return Duration::ZERO;
        }
        // 1 + 2 + ... + (max_attempts - 1) backoff units
        let n = u64::from(self.max_attempts.saturating_sub(1));
        let units = n * (n + 1) / 2;
        u32::try_from(units)
            .ok()
            .and_then(|units| self.backoff.checked_mul(units))
            .unwrap_or(Duration::MAX)
    }
}

/// Upstream generation API settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeminiConfig {
    pub base_url: String,
    pub model: String,
    /// Per-attempt request timeout.
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
        }
    }
}

/// Where the upstream API key comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// An environment variable.
    Env { var: String },
    /// The `api_keys` table through Supabase's REST interface.
    Supabase {
        url: String,
        service_role_key: String,
    },
    /// The `api_keys` table over a direct Postgres connection.
    Postgres { database_url: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub max_body_bytes: usize,
    pub gemini: GeminiConfig,
    pub credentials: CredentialSource,
}

impl ServerConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let gemini = GeminiConfig {
            base_url: var("GEMINI_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            model: var("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            timeout: Duration::from_secs(parse_or(
                "TRYON_UPSTREAM_TIMEOUT_SECS",
                var("TRYON_UPSTREAM_TIMEOUT_SECS"),
                DEFAULT_UPSTREAM_TIMEOUT_SECS,
            )),
            retry: RetryPolicy {
                max_attempts: parse_or(
                    "TRYON_MAX_ATTEMPTS",
                    var("TRYON_MAX_ATTEMPTS"),
                    DEFAULT_MAX_ATTEMPTS,
                )
                .max(1),
                backoff: Duration::from_millis(parse_or(
                    "TRYON_BACKOFF_MS",
                    var("TRYON_BACKOFF_MS"),
                    DEFAULT_BACKOFF_MS,
                )),
            },
        };

        let credentials = match var("TRYON_CREDENTIAL_SOURCE").as_deref() {
            None | Some("env") => CredentialSource::Env {
                var: DEFAULT_API_KEY_VAR.to_string(),
            },
            Some("supabase") => CredentialSource::Supabase {
                url: var("SUPABASE_URL")
                    .ok_or(ConfigError::Missing("SUPABASE_URL"))?
                    .trim_end_matches('/')
                    .to_string(),
                service_role_key: var("SUPABASE_SERVICE_ROLE_KEY")
                    .ok_or(ConfigError::Missing("SUPABASE_SERVICE_ROLE_KEY"))?,
            },
            Some("postgres") => CredentialSource::Postgres {
                database_url: var("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
            },
            Some(other) => return Err(ConfigError::UnknownCredentialSource(other.to_string())),
        };

        Ok(Self {
            bind_addr: var("TRYON_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            max_body_bytes: parse_or(
                "TRYON_MAX_BODY_BYTES",
                var("TRYON_MAX_BODY_BYTES"),
                DEFAULT_MAX_BODY_BYTES,
            ),
            gemini,
            credentials,
        })
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display + Copy,
{
    match raw {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Invalid {}={:?}, using default {}", key, raw, default);
            default
        }),
    }
}
