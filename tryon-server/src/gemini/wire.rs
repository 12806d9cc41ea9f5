//! Gemini `generateContent` wire format.
//!
//! Outbound payloads are built from a validated [`GenerationRequest`].
//! Inbound bodies have been seen with both camelCase (`inlineData`,
//! `mimeType`) and snake_case (`inline_data`, `mime_type`) field names; serde
//! aliases accept either, and [`GenerateContentResponse::normalize`] reduces
//! the body to a single [`UpstreamOutcome`] so nothing past this module sees
//! the upstream's inconsistencies.

use serde::{Deserialize, Serialize};
use tryon_core::data_url::{DataUrl, DEFAULT_IMAGE_MIME};
use tryon_core::{GenerationRequest, ProxyError, ProxyResult};

/// Finish reason of a normal, complete generation
pub const FINISH_STOP: &str = "STOP";

// ============================================================================
// Request
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct Content {
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Part {
    InlineData { inline_data: Blob },
    Text { text: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct Blob {
    pub mime_type: String,
    pub data: String,
}

/// Sampling parameters and the request for image output
#[derive(Debug, Clone, Serialize)]
pub struct GenerationConfig {
    pub temperature: f64,
    #[serde(rename = "topK")]
    pub top_k: u32,
    #[serde(rename = "topP")]
    pub top_p: f64,
    #[serde(rename = "maxOutputTokens")]
    pub max_output_tokens: u32,
    pub response_modalities: Vec<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.4,
            top_k: 32,
            top_p: 1.0,
            max_output_tokens: 8192,
            response_modalities: vec!["image".to_string()],
        }
    }
}

impl GenerateContentRequest {
    /// Images first, in request order, then the instruction text.
    pub fn for_request(request: &GenerationRequest) -> Self {
        let mut parts: Vec<Part> = request
            .images()
            .into_iter()
            .map(|image| Part::InlineData {
                inline_data: Blob {
                    mime_type: image.mime_type().to_string(),
                    data: image.payload().to_string(),
                },
            })
            .collect();
        parts.push(Part::Text {
            text: request.prompt(),
        });

        Self {
            contents: vec![Content { parts }],
            generation_config: GenerationConfig::default(),
        }
    }

    pub fn part_count(&self) -> usize {
        self.contents.iter().map(|c| c.parts.len()).sum()
    }

    /// `image` / `text` per part, for logging.
    pub fn part_kinds(&self) -> Vec<&'static str> {
        self.contents
            .iter()
            .flat_map(|c| c.parts.iter())
            .map(|p| match p {
                Part::InlineData { .. } => "image",
                Part::Text { .. } => "text",
            })
            .collect()
    }
}

// ============================================================================
// Response
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Option<Vec<Candidate>>,
    #[serde(default, alias = "prompt_feedback")]
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
    #[serde(default, alias = "finish_reason")]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Option<Vec<ResponsePart>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsePart {
    #[serde(default, alias = "inline_data")]
    pub inline_data: Option<InlineBlob>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineBlob {
    #[serde(default, alias = "mime_type")]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub data: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default, alias = "block_reason")]
    pub block_reason: Option<String>,
    #[serde(default, alias = "block_reason_message")]
    pub block_reason_message: Option<String>,
}

/// Canonical reading of an upstream success body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamOutcome {
    Image(DataUrl),
    Blocked {
        reason: String,
        message: Option<String>,
    },
    Stopped {
        reason: String,
    },
    NoImage,
}

impl GenerateContentResponse {
    pub fn parse(body: &str) -> ProxyResult<Self> {
        serde_json::from_str(body).map_err(|e| ProxyError::MalformedResponse(e.to_string()))
    }

    /// Block first, then the first candidate carrying image data, then the
    /// first candidate's finish reason.
    pub fn normalize(self) -> UpstreamOutcome {
        if let Some(feedback) = self.prompt_feedback {
            if let Some(reason) = feedback.block_reason.filter(|r| !r.is_empty()) {
                return UpstreamOutcome::Blocked {
                    reason,
                    message: feedback.block_reason_message.filter(|m| !m.is_empty()),
                };
            }
        }

        let candidates = self.candidates.unwrap_or_default();

        let image = candidates
            .iter()
            .filter_map(|c| c.content.as_ref()?.parts.as_ref())
            .flatten()
            .filter_map(|part| part.inline_data.as_ref())
            .find_map(|blob| {
                let data = blob.data.as_deref().filter(|d| !d.is_empty())?;
                let mime = blob.mime_type.as_deref().unwrap_or(DEFAULT_IMAGE_MIME);
                Some(DataUrl::new(mime, data))
            });
        if let Some(image) = image {
            return UpstreamOutcome::Image(image);
        }

        match candidates.first().and_then(|c| c.finish_reason.clone()) {
            Some(reason) if !reason.is_empty() && reason != FINISH_STOP => {
                UpstreamOutcome::Stopped { reason }
            }
            _ => UpstreamOutcome::NoImage,
        }
    }
}

impl UpstreamOutcome {
    pub fn into_result(self) -> ProxyResult<DataUrl> {
        match self {
            UpstreamOutcome::Image(image) => Ok(image),
            UpstreamOutcome::Blocked { reason, message } => {
                Err(ProxyError::Blocked { reason, message })
            }
            UpstreamOutcome::Stopped { reason } => Err(ProxyError::GenerationStopped { reason }),
            UpstreamOutcome::NoImage => Err(ProxyError::NoImage),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tryon_core::GenerateBody;

    fn outcome(body: serde_json::Value) -> UpstreamOutcome {
        GenerateContentResponse::parse(&body.to_string())
            .unwrap()
            .normalize()
    }

    #[test]
    fn request_payload_shape() {
        let request = GenerateBody {
            action: Some("generateTryOn".into()),
            model_image: Some("data:image/png;base64,AAAA".into()),
            garment_image: Some("data:image/jpeg;base64,BBBB".into()),
            ..Default::default()
        }
        .validate()
        .unwrap();

        let payload = GenerateContentRequest::for_request(&request);
        assert_eq!(payload.part_kinds(), vec!["image", "image", "text"]);

        let value = serde_json::to_value(&payload).unwrap();
        let parts = &value["contents"][0]["parts"];
        assert_eq!(parts[0]["inline_data"]["mime_type"], "image/png");
        assert_eq!(parts[1]["inline_data"]["data"], "BBBB");
        assert!(parts[2]["text"].as_str().unwrap().contains("virtual try-on"));

        let config = &value["generationConfig"];
        assert_eq!(config["temperature"], json!(0.4));
        assert_eq!(config["topK"], json!(32));
        assert_eq!(config["topP"], json!(1.0));
        assert_eq!(config["maxOutputTokens"], json!(8192));
        assert_eq!(config["response_modalities"], json!(["image"]));
    }

    #[test]
    fn camel_case_image() {
        let result = outcome(json!({
            "candidates": [{
                "content": { "parts": [
                    { "text": "Here you go" },
                    { "inlineData": { "mimeType": "image/jpeg", "data": "QUJD" } }
                ]},
                "finishReason": "STOP"
            }]
        }));
        assert_eq!(
            result,
            UpstreamOutcome::Image(DataUrl::new("image/jpeg", "QUJD"))
        );
    }

    #[test]
    fn snake_case_image() {
        let result = outcome(json!({
            "candidates": [{
                "content": { "parts": [
                    { "inline_data": { "mime_type": "image/webp", "data": "QUJD" } }
                ]}
            }]
        }));
        let image = result.into_result().unwrap();
        assert_eq!(image.to_string(), "data:image/webp;base64,QUJD");
    }

    #[test]
    fn missing_mime_defaults_to_png() {
        let result = outcome(json!({
            "candidates": [{ "content": { "parts": [{ "inlineData": { "data": "QUJD" } }] } }]
        }));
        assert_eq!(
            result.into_result().unwrap().to_string(),
            "data:image/png;base64,QUJD"
        );
    }

    #[test]
    fn later_candidate_can_carry_the_image() {
        let result = outcome(json!({
            "candidates": [
                { "content": { "parts": [{ "text": "thinking" }] }, "finishReason": "STOP" },
                { "content": { "parts": [{ "inlineData": { "mimeType": "image/png", "data": "WFla" } }] } }
            ]
        }));
        assert_eq!(result, UpstreamOutcome::Image(DataUrl::new("image/png", "WFla")));
    }

    #[test]
    fn block_reason_wins() {
        let result = outcome(json!({
            "promptFeedback": { "blockReason": "SAFETY", "blockReasonMessage": "Unsafe input" },
            "candidates": [{ "content": { "parts": [{ "inlineData": { "data": "QUJD" } }] } }]
        }));
        let err = result.into_result().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Request was blocked. Reason: SAFETY. Unsafe input"
        );
    }

    #[test]
    fn abnormal_finish_reason() {
        let result = outcome(json!({
            "candidates": [{ "content": { "parts": [{ "text": "no" }] }, "finishReason": "IMAGE_SAFETY" }]
        }));
        assert_eq!(
            result,
            UpstreamOutcome::Stopped {
                reason: "IMAGE_SAFETY".to_string()
            }
        );
    }

    #[test]
    fn normal_stop_without_image() {
        let result = outcome(json!({
            "candidates": [{ "content": { "parts": [{ "text": "sorry" }] }, "finishReason": "STOP" }]
        }));
        assert_eq!(result, UpstreamOutcome::NoImage);
        assert_eq!(
            result.into_result().unwrap_err().to_string(),
            "The AI model did not return an image"
        );
    }

    #[test]
    fn empty_and_null_shapes() {
        assert_eq!(outcome(json!({})), UpstreamOutcome::NoImage);
        assert_eq!(
            outcome(json!({ "candidates": null, "promptFeedback": null })),
            UpstreamOutcome::NoImage
        );
        assert_eq!(
            outcome(json!({ "candidates": [{ "content": null }] })),
            UpstreamOutcome::NoImage
        );
    }

    #[test]
    fn unparseable_body() {
        let err = GenerateContentResponse::parse("<html>").unwrap_err();
        assert!(err.to_string().starts_with("Failed to parse Gemini response"));
    }
}
