//! Conversion between embedded image strings and reference images

use tracing::debug;

use crate::error::{AppError, Result};
use crate::image::ReferenceImage;

const MEDIA_TYPE_MARKER: &str = "data:";
const BASE64_SEPARATOR: &str = ";base64,";

/// Images that survived decoding, plus how many were dropped
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedImages {
    pub images: Vec<ReferenceImage>,
    pub dropped: usize,
}

/// Parse `data:<media type>;base64,<payload>`
///
/// The payload is not checked against the media type.
pub fn decode(embedded: &str) -> Result<ReferenceImage> {
    let mut pieces = embedded.split(BASE64_SEPARATOR);
    let (descriptor, payload) = match (pieces.next(), pieces.next(), pieces.next()) {
        (Some(descriptor), Some(payload), None) => (descriptor, payload),
        _ => {
            return Err(AppError::Decode(
                "expected exactly one ';base64,' separator".to_string(),
            ))
        }
    };

    let media_type = descriptor
        .strip_prefix(MEDIA_TYPE_MARKER)
        .ok_or_else(|| AppError::Decode("missing 'data:' media type marker".to_string()))?;

    if media_type.is_empty() {
        return Err(AppError::Decode("empty media type".to_string()));
    }

    Ok(ReferenceImage::new(media_type, payload))
}

/// Render an image as its embedded string
pub fn encode(image: &ReferenceImage) -> String {
    format!(
        "{}{}{}{}",
        MEDIA_TYPE_MARKER, image.media_type, BASE64_SEPARATOR, image.payload
    )
}

/// Decode every input in order, silently skipping malformed ones
pub fn decode_all<S: AsRef<str>>(embedded: &[S]) -> DecodedImages {
    let mut decoded = DecodedImages::default();

    for (index, item) in embedded.iter().enumerate() {
        match decode(item.as_ref()) {
            Ok(image) => decoded.images.push(image),
            Err(e) => {
                debug!(index = index, error = %e, "Dropping malformed embedded image");
                decoded.dropped += 1;
            }
        }
    }

    decoded
}
