//! Error taxonomy for the generation proxy
//!
//! Every failure the proxy can report is a variant here. The `Display` text is
//! exactly what the caller receives in the `{ "error": ... }` envelope.

use thiserror::Error;

use crate::data_url::DataUrlError;

/// Result alias used across the proxy pipeline
pub type ProxyResult<T> = Result<T, ProxyError>;

/// Proxy failure, from input validation through to response normalization
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProxyError {
    #[error("Invalid request body: {0}")]
    InvalidRequest(String),

    #[error("Invalid action")]
    InvalidAction,

    #[error("{}", missing_fields_message(.0))]
    MissingFields(Vec<&'static str>),

    #[error("{field}: {source}")]
    InvalidDataUrl {
        field: &'static str,
        source: DataUrlError,
    },

    #[error("Gemini API key not found in database")]
    CredentialUnavailable,

    #[error("Gemini API error after {attempts} attempts: {body}")]
    Upstream { attempts: u32, body: String },

    #[error("{}", blocked_message(.reason, .message.as_deref()))]
    Blocked {
        reason: String,
        message: Option<String>,
    },

    #[error("Image generation stopped unexpectedly. Reason: {reason}")]
    GenerationStopped { reason: String },

    #[error("The AI model did not return an image")]
    NoImage,

    #[error("Failed to parse Gemini response: {0}")]
    MalformedResponse(String),
}

fn missing_fields_message(fields: &[&'static str]) -> String {
    match fields {
        [] => "required fields are missing".to_string(),
        [one] => format!("{} is required", one),
        [init @ .., last] => format!("{} and {} are required", init.join(", "), last),
    }
}

fn blocked_message(reason: &str, message: Option<&str>) -> String {
    let text = format!(
        "Request was blocked. Reason: {}. {}",
        reason,
        message.unwrap_or("")
    );
    text.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_are_named() {
        assert_eq!(
            ProxyError::MissingFields(vec!["userImage"]).to_string(),
            "userImage is required"
        );
        assert_eq!(
            ProxyError::MissingFields(vec!["modelImage", "garmentImage"]).to_string(),
            "modelImage and garmentImage are required"
        );
    }

    #[test]
    fn blocked_message_without_detail_has_no_trailing_space() {
        let err = ProxyError::Blocked {
            reason: "SAFETY".to_string(),
            message: None,
        };
        assert_eq!(err.to_string(), "Request was blocked. Reason: SAFETY.");

        let err = ProxyError::Blocked {
            reason: "OTHER".to_string(),
            message: Some("Prompt rejected".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "Request was blocked. Reason: OTHER. Prompt rejected"
        );
    }

    #[test]
    fn upstream_message_carries_attempts_and_body() {
        let err = ProxyError::Upstream {
            attempts: 3,
            body: "{\"error\":{\"code\":503}}".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("after 3 attempts"));
        assert!(text.contains("\"code\":503"));
    }
}
