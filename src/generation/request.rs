//! Request payload for the `generateContent` endpoint

use serde::{Deserialize, Serialize};

use crate::image::{codec, ReferenceImage};

/// Body of one generation request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePayload {
    pub contents: Vec<Content>,
    pub generation_config: GenerationSettings,
}

/// A group of parts; requests always carry exactly one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// One content unit: text or inline image data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

/// Transport form of an image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    #[serde(default, alias = "mime_type")]
    pub mime_type: String,
    #[serde(default)]
    pub data: String,
}

impl From<&ReferenceImage> for InlineData {
    fn from(image: &ReferenceImage) -> Self {
        Self {
            mime_type: image.media_type.clone(),
            data: image.payload.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationSettings {
    pub response_modalities: Vec<Modality>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Modality {
    Text,
    Image,
}

impl GeneratePayload {
    /// Parts of the single content block
    pub fn parts(&self) -> &[Part] {
        self.contents
            .first()
            .map(|content| content.parts.as_slice())
            .unwrap_or_default()
    }

    /// Number of image parts in the request
    pub fn image_count(&self) -> usize {
        self.parts()
            .iter()
            .filter(|part| matches!(part, Part::InlineData { .. }))
            .count()
    }
}

/// Instruction first, then every image in the order given
///
/// The model may answer with text alongside or instead of an image, so both
/// modalities are accepted.
pub fn build(instruction: &str, images: &[ReferenceImage]) -> GeneratePayload {
    let mut parts = Vec::with_capacity(images.len() + 1);
    parts.push(Part::Text {
        text: instruction.to_string(),
    });
    parts.extend(images.iter().map(|image| Part::InlineData {
        inline_data: InlineData::from(image),
    }));

    GeneratePayload {
        contents: vec![Content { parts }],
        generation_config: GenerationSettings {
            response_modalities: vec![Modality::Text, Modality::Image],
        },
    }
}

/// Build from embedded strings, leaving out any that fail to decode
///
/// Returns the payload and the number of dropped images.
pub fn build_from_embedded<S: AsRef<str>>(
    instruction: &str,
    embedded: &[S],
) -> (GeneratePayload, usize) {
    let decoded = codec::decode_all(embedded);
    (build(instruction, &decoded.images), decoded.dropped)
}
