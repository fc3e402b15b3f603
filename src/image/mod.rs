//! Reference images and their embedded string form

pub mod codec;

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Media type assumed when the endpoint does not report one
pub const DEFAULT_MEDIA_TYPE: &str = "image/png";

/// An image carried as a media type plus base64 text
///
/// Serializes as its embedded `data:<media type>;base64,<payload>` string, so
/// snapshots handed to the presentation layer can be used as image sources
/// directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ReferenceImage {
    pub media_type: String,
    pub payload: String,
}

impl ReferenceImage {
    pub fn new(media_type: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            media_type: media_type.into(),
            payload: payload.into(),
        }
    }

    /// Wrap raw image bytes, e.g. a file the user picked
    pub fn from_bytes(media_type: impl Into<String>, data: &[u8]) -> Self {
        Self::new(media_type, STANDARD.encode(data))
    }

    /// Decode the payload back to raw bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        STANDARD
            .decode(self.payload.trim())
            .map_err(|e| AppError::Decode(format!("Invalid base64 data: {}", e)))
    }
}

impl From<ReferenceImage> for String {
    fn from(image: ReferenceImage) -> Self {
        codec::encode(&image)
    }
}

impl TryFrom<String> for ReferenceImage {
    type Error = AppError;

    fn try_from(embedded: String) -> Result<Self> {
        codec::decode(&embedded)
    }
}
