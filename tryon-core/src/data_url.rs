//! Self-describing inline images: `data:<mime>;base64,<payload>`.
//!
//! The browser hands every image to the proxy in this form and the proxy hands
//! the generated image back the same way. Parsing validates the envelope and
//! the base64 payload so malformed input is rejected with a clear diagnostic
//! instead of being forwarded upstream.

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;

const SCHEME: &str = "data:";
const BASE64_MARKER: &str = ";base64,";

/// Mime type used when the upstream omits one for a returned image
pub const DEFAULT_IMAGE_MIME: &str = "image/png";

/// Data URL parse failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DataUrlError {
    #[error("Data URL must be a non-empty string")]
    Empty,

    #[error("Invalid data URL format. Expected format: data:image/...;base64,...")]
    InvalidFormat,

    #[error("Invalid base64 payload in data URL: {0}")]
    InvalidPayload(String),
}

/// A validated data URL, split into its mime type and base64 payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    mime_type: String,
    payload: String,
}

impl DataUrl {
    /// Wrap an already-encoded payload.
    ///
    /// An empty mime type is replaced with [`DEFAULT_IMAGE_MIME`].
    pub fn new(mime_type: impl Into<String>, payload: impl Into<String>) -> Self {
        let mime_type = mime_type.into();
        let mime_type = if mime_type.trim().is_empty() {
            DEFAULT_IMAGE_MIME.to_string()
        } else {
            mime_type
        };
        Self {
            mime_type,
            payload: payload.into(),
        }
    }

    /// Parse and validate `data:<mime>;base64,<payload>`.
    pub fn parse(input: &str) -> Result<Self, DataUrlError> {
        if input.is_empty() {
            return Err(DataUrlError::Empty);
        }

        let rest = input
            .strip_prefix(SCHEME)
            .ok_or(DataUrlError::InvalidFormat)?;
        let (mime_type, payload) = rest
            .split_once(BASE64_MARKER)
            .ok_or(DataUrlError::InvalidFormat)?;

        if mime_type.is_empty() || mime_type.contains(';') || payload.is_empty() {
            return Err(DataUrlError::InvalidFormat);
        }

        STANDARD
            .decode(payload)
            .map_err(|e| DataUrlError::InvalidPayload(e.to_string()))?;

        Ok(Self {
            mime_type: mime_type.to_string(),
            payload: payload.to_string(),
        })
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// The base64 text, exactly as received.
    pub fn payload(&self) -> &str {
        &self.payload
    }
}

impl FromStr for DataUrl {
    type Err = DataUrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for DataUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}{}", SCHEME, self.mime_type, BASE64_MARKER, self.payload)
    }
}
