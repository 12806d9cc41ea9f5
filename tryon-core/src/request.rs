//! Generation requests, from raw JSON body to a validated, typed request.
//!
//! The browser posts a flat JSON object whose `action` selects which of the
//! optional image fields are required. [`GenerateBody::validate`] checks the
//! action, reports every missing field for it at once, and decodes the data
//! URLs, all before anything touches the network.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::data_url::{DataUrl, DataUrlError};
use crate::error::{ProxyError, ProxyResult};
use crate::prompt;

/// The three generation operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    GenerateModel,
    GenerateTryOn,
    GeneratePose,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::GenerateModel => "generateModel",
            Action::GenerateTryOn => "generateTryOn",
            Action::GeneratePose => "generatePose",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = ProxyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "generateModel" => Ok(Action::GenerateModel),
            "generateTryOn" => Ok(Action::GenerateTryOn),
            "generatePose" => Ok(Action::GeneratePose),
            _ => Err(ProxyError::InvalidAction),
        }
    }
}

/// Request body as posted by the browser
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateBody {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub garment_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub try_on_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pose_instruction: Option<String>,
    /// Image fields that were present but not JSON strings.
    #[serde(skip)]
    pub non_string_images: Vec<&'static str>,
}

const IMAGE_FIELDS: [&str; 4] = ["userImage", "modelImage", "garmentImage", "tryOnImage"];

/// A validated generation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationRequest {
    GenerateModel {
        user_image: DataUrl,
    },
    GenerateTryOn {
        model_image: DataUrl,
        garment_image: DataUrl,
    },
    GeneratePose {
        try_on_image: DataUrl,
        pose_instruction: String,
    },
}

impl GenerateBody {
    /// Deserialize a raw request body.
    ///
    /// An image field holding a number, object or other non-string is set
    /// aside rather than failing the whole body, so validation can report it
    /// against the field it belongs to.
    pub fn from_json(bytes: &[u8]) -> ProxyResult<Self> {
        let invalid = |e: serde_json::Error| ProxyError::InvalidRequest(e.to_string());
        let mut value: Value = serde_json::from_slice(bytes).map_err(invalid)?;

        let mut non_string_images = Vec::new();
        if let Some(object) = value.as_object_mut() {
            for field in IMAGE_FIELDS {
                if object
                    .get(field)
                    .is_some_and(|v| !v.is_string() && !v.is_null())
                {
                    object.remove(field);
                    non_string_images.push(field);
                }
            }
        }

        let mut body: Self = serde_json::from_value(value).map_err(invalid)?;
        body.non_string_images = non_string_images;
        Ok(body)
    }

    /// Check the action and its required fields, then decode the images.
    pub fn validate(self) -> ProxyResult<GenerationRequest> {
        let action: Action = self
            .action
            .as_deref()
            .ok_or(ProxyError::InvalidAction)?
            .parse()?;

        match action {
            Action::GenerateModel => {
                let [user_image] =
                    require(&self.non_string_images, [("userImage", self.user_image)])?;
                Ok(GenerationRequest::GenerateModel {
                    user_image: decode("userImage", &user_image)?,
                })
            }
            Action::GenerateTryOn => {
                let [model_image, garment_image] = require(
                    &self.non_string_images,
                    [
                        ("modelImage", self.model_image),
                        ("garmentImage", self.garment_image),
                    ],
                )?;
                Ok(GenerationRequest::GenerateTryOn {
                    model_image: decode("modelImage", &model_image)?,
                    garment_image: decode("garmentImage", &garment_image)?,
                })
            }
            Action::GeneratePose => {
                let [try_on_image, pose_instruction] = require(
                    &self.non_string_images,
                    [
                        ("tryOnImage", self.try_on_image),
                        ("poseInstruction", self.pose_instruction),
                    ],
                )?;
                Ok(GenerationRequest::GeneratePose {
                    try_on_image: decode("tryOnImage", &try_on_image)?,
                    pose_instruction,
                })
            }
        }
    }
}

/// Unwrap every field or report all the missing ones. Empty strings count as
/// missing; a field listed in `non_string` is present but cannot be an image.
fn require<const N: usize>(
    non_string: &[&'static str],
    fields: [(&'static str, Option<String>); N],
) -> ProxyResult<[String; N]> {
    let missing: Vec<&'static str> = fields
        .iter()
        .filter(|(name, value)| {
            value.as_deref().map_or(true, str::is_empty) && !non_string.contains(name)
        })
        .map(|(name, _)| *name)
        .collect();
    if !missing.is_empty() {
        return Err(ProxyError::MissingFields(missing));
    }
    if let Some(&(field, _)) = fields.iter().find(|(name, _)| non_string.contains(name)) {
        return Err(ProxyError::InvalidDataUrl {
            field,
            source: DataUrlError::Empty,
        });
    }
    Ok(fields.map(|(_, value)| value.unwrap_or_default()))
}

fn decode(field: &'static str, raw: &str) -> ProxyResult<DataUrl> {
    let url = DataUrl::parse(raw).map_err(|source| ProxyError::InvalidDataUrl { field, source })?;
    debug!(
        "Parsed {}: {} ({} base64 chars)",
        field,
        url.mime_type(),
        url.payload().len()
    );
    Ok(url)
}

impl GenerationRequest {
    pub fn action(&self) -> Action {
        match self {
            GenerationRequest::GenerateModel { .. } => Action::GenerateModel,
            GenerationRequest::GenerateTryOn { .. } => Action::GenerateTryOn,
            GenerationRequest::GeneratePose { .. } => Action::GeneratePose,
        }
    }

    /// Input images in the order the model expects them.
    pub fn images(&self) -> Vec<&DataUrl> {
        match self {
            GenerationRequest::GenerateModel { user_image } => vec![user_image],
            GenerationRequest::GenerateTryOn {
                model_image,
                garment_image,
            } => vec![model_image, garment_image],
            GenerationRequest::GeneratePose { try_on_image, .. } => vec![try_on_image],
        }
    }

    /// Instruction text that follows the images.
    pub fn prompt(&self) -> String {
        match self {
            GenerationRequest::GenerateModel { .. } => prompt::MODEL_PROMPT.to_string(),
            GenerationRequest::GenerateTryOn { .. } => prompt::TRY_ON_PROMPT.to_string(),
            GenerationRequest::GeneratePose {
                pose_instruction, ..
            } => prompt::pose_prompt(pose_instruction),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IMG: &str = "data:image/png;base64,AAAA";
    const JPG: &str = "data:image/jpeg;base64,BBBB";

    fn body(action: &str) -> GenerateBody {
        GenerateBody {
            action: Some(action.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn parses_camel_case_body() {
        let raw = br#"{"action":"generatePose","tryOnImage":"data:image/png;base64,AAAA","poseInstruction":"Side profile view"}"#;
        let parsed = GenerateBody::from_json(raw).unwrap();
        assert_eq!(parsed.try_on_image.as_deref(), Some(IMG));

        let request = parsed.validate().unwrap();
        assert_eq!(request.action(), Action::GeneratePose);
        assert!(request.prompt().contains("Side profile view"));
    }

    #[test]
    fn rejects_non_json_body() {
        let err = GenerateBody::from_json(b"not json").unwrap_err();
        assert!(matches!(err, ProxyError::InvalidRequest(_)));
    }

    #[test]
    fn unknown_or_missing_action() {
        assert_eq!(body("dance").validate(), Err(ProxyError::InvalidAction));
        assert_eq!(
            GenerateBody::default().validate(),
            Err(ProxyError::InvalidAction)
        );
    }

    #[test]
    fn try_on_reports_missing_model_image() {
        let mut b = body("generateTryOn");
        b.garment_image = Some(IMG.to_string());
        let err = b.validate().unwrap_err();
        assert_eq!(err, ProxyError::MissingFields(vec!["modelImage"]));
        assert!(err.to_string().contains("modelImage"));
    }

    #[test]
    fn try_on_reports_both_missing_fields() {
        let err = body("generateTryOn").validate().unwrap_err();
        assert_eq!(err.to_string(), "modelImage and garmentImage are required");
    }

    #[test]
    fn empty_string_counts_as_missing() {
        let mut b = body("generateModel");
        b.user_image = Some(String::new());
        assert_eq!(
            b.validate(),
            Err(ProxyError::MissingFields(vec!["userImage"]))
        );
    }

    #[test]
    fn non_string_image_is_reported_against_its_field() {
        let raw = br#"{"action":"generateModel","userImage":5}"#;
        let err = GenerateBody::from_json(raw).unwrap().validate().unwrap_err();
        assert_eq!(
            err,
            ProxyError::InvalidDataUrl {
                field: "userImage",
                source: DataUrlError::Empty
            }
        );
        assert_eq!(
            err.to_string(),
            "userImage: Data URL must be a non-empty string"
        );
    }

    #[test]
    fn missing_fields_are_reported_before_non_string_images() {
        let raw = br#"{"action":"generateTryOn","garmentImage":{"url":"x"}}"#;
        let err = GenerateBody::from_json(raw).unwrap().validate().unwrap_err();
        assert_eq!(err, ProxyError::MissingFields(vec!["modelImage"]));
    }

    #[test]
    fn non_string_image_for_another_action_is_ignored() {
        let raw = br#"{"action":"generateModel","userImage":"data:image/png;base64,AAAA","garmentImage":[1]}"#;
        let request = GenerateBody::from_json(raw).unwrap().validate().unwrap();
        assert_eq!(request.action(), Action::GenerateModel);
    }

    #[test]
    fn non_string_action_is_still_a_body_error() {
        let err = GenerateBody::from_json(br#"{"action":7}"#).unwrap_err();
        assert!(matches!(err, ProxyError::InvalidRequest(_)));
    }

    #[test]
    fn malformed_image_names_the_field() {
        let mut b = body("generateTryOn");
        b.model_image = Some(IMG.to_string());
        b.garment_image = Some("https://example.com/shirt.png".to_string());
        let err = b.validate().unwrap_err();
        assert_eq!(
            err,
            ProxyError::InvalidDataUrl {
                field: "garmentImage",
                source: DataUrlError::InvalidFormat
            }
        );
        assert!(err.to_string().starts_with("garmentImage: Invalid data URL format"));
    }

    #[test]
    fn try_on_images_keep_model_first() {
        let mut b = body("generateTryOn");
        b.model_image = Some(IMG.to_string());
        b.garment_image = Some(JPG.to_string());
        let request = b.validate().unwrap();
        let mimes: Vec<&str> = request.images().iter().map(|i| i.mime_type()).collect();
        assert_eq!(mimes, vec!["image/png", "image/jpeg"]);
        assert_eq!(request.prompt(), prompt::TRY_ON_PROMPT);
    }

    #[test]
    fn action_round_trips_through_str() {
        for action in [
            Action::GenerateModel,
            Action::GenerateTryOn,
            Action::GeneratePose,
        ] {
            assert_eq!(action.as_str().parse::<Action>().unwrap(), action);
        }
    }
}
