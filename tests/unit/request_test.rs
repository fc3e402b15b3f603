//! Unit tests for request building and image extraction

use serde_json::json;
use virtual_atelier::generation::{self, Part};
use virtual_atelier::image::ReferenceImage;
use virtual_atelier::AppError;

#[test]
fn test_instruction_is_first_part() {
    let images = vec![
        ReferenceImage::new("image/png", "ONE"),
        ReferenceImage::new("image/jpeg", "TWO"),
    ];
    let payload = generation::build("side profile view", &images);

    assert_eq!(payload.contents.len(), 1);
    assert_eq!(
        payload.parts()[0],
        Part::Text {
            text: "side profile view".to_string()
        }
    );
    assert_eq!(payload.image_count(), 2);
}

#[test]
fn test_images_keep_supplied_order() {
    let images = vec![
        ReferenceImage::new("image/png", "ONE"),
        ReferenceImage::new("image/jpeg", "TWO"),
        ReferenceImage::new("image/webp", "THREE"),
    ];
    let payload = generation::build("prompt", &images);

    let data: Vec<&str> = payload
        .parts()
        .iter()
        .filter_map(|part| match part {
            Part::InlineData { inline_data } => Some(inline_data.data.as_str()),
            Part::Text { .. } => None,
        })
        .collect();
    assert_eq!(data, vec!["ONE", "TWO", "THREE"]);
}

#[test]
fn test_part_count_is_text_plus_valid_images() {
    let (payload, dropped) = generation::build_from_embedded(
        "prompt",
        &[
            "garbage".to_string(),
            "data:image/png;base64,AAA".to_string(),
        ],
    );

    assert_eq!(dropped, 1);
    assert_eq!(payload.parts().len(), 2);
}

#[test]
fn test_declares_text_and_image_modalities() {
    let payload = generation::build("prompt", &[]);
    let value = serde_json::to_value(&payload).unwrap();

    assert_eq!(
        value["generationConfig"]["responseModalities"],
        json!(["TEXT", "IMAGE"])
    );
}

#[test]
fn test_extract_skips_text_parts() {
    let response = json!({
        "candidates": [{
            "content": {
                "parts": [
                    { "text": "A chic look, as requested." },
                    { "inlineData": { "mimeType": "image/png", "data": "GENERATED" } }
                ]
            }
        }]
    });

    let image = generation::extract_image(&response).unwrap();
    assert_eq!(image, ReferenceImage::new("image/png", "GENERATED"));
}

#[test]
fn test_extract_text_only_response_fails() {
    let response = json!({
        "candidates": [{ "content": { "parts": [{ "text": "I cannot do that." }] } }]
    });

    let err = generation::extract_image(&response).unwrap_err();
    assert!(matches!(err, AppError::Extraction { .. }));
    assert_eq!(err.to_string(), "Failed to get image data from API");
}

#[test]
fn test_extract_empty_response_fails() {
    assert!(matches!(
        generation::extract_image(&json!({})),
        Err(AppError::Extraction { .. })
    ));
}
