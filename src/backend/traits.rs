//! Common trait for image generation backends

use async_trait::async_trait;

use crate::error::Result;
use crate::generation::GeneratePayload;
use crate::image::ReferenceImage;

/// Something that turns one generation payload into one image
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Get the backend name
    fn name(&self) -> &str;

    /// Model identifier requests are sent to
    fn model(&self) -> &str;

    /// Deliver the payload and return the generated image
    async fn generate(&self, payload: &GeneratePayload) -> Result<ReferenceImage>;
}
