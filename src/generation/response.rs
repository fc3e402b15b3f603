//! Image extraction from `generateContent` responses

use serde::Deserialize;
use serde_json::Value;
use tracing::{error, warn};

use crate::error::{AppError, Result};
use crate::image::{ReferenceImage, DEFAULT_MEDIA_TYPE};

use super::request::InlineData;

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default, alias = "inline_data")]
    inline_data: Option<InlineData>,
}

/// Pull the first image out of the first candidate
///
/// A response without image data is an [`AppError::Extraction`] that keeps the
/// raw body for diagnostics.
pub fn extract_image(raw: &Value) -> Result<ReferenceImage> {
    let response = match GenerateContentResponse::deserialize(raw) {
        Ok(response) => response,
        Err(e) => {
            warn!(error = %e, "Response did not match the expected candidate layout");
            GenerateContentResponse::default()
        }
    };

    let parts = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| content.parts)
        .unwrap_or_default();

    let mut text = Vec::new();
    for part in parts {
        if let Some(inline) = part.inline_data.filter(|inline| !inline.data.is_empty()) {
            let media_type = if inline.mime_type.is_empty() {
                DEFAULT_MEDIA_TYPE.to_string()
            } else {
                inline.mime_type
            };
            return Ok(ReferenceImage::new(media_type, inline.data));
        }
        if let Some(t) = part.text {
            text.push(t);
        }
    }

    let raw = raw.to_string();
    error!(
        model_text = %text.join(" "),
        response = %raw,
        "Image generation failed: no image data in response"
    );
    Err(AppError::Extraction { raw })
}
