//! Generation payloads: request assembly and image extraction

pub mod request;
pub mod response;

pub use request::{build, build_from_embedded, Content, GeneratePayload, InlineData, Modality, Part};
pub use response::extract_image;
