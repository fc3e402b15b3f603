//! Shared fixtures for functional tests

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use virtual_atelier::backend::GenerationBackend;
use virtual_atelier::config::JobDefinition;
use virtual_atelier::generation::GeneratePayload;
use virtual_atelier::image::ReferenceImage;
use virtual_atelier::{AppError, Result};

pub const TEMPLATE: &str = "Professional model, white background, {instruction}";

pub fn jobs() -> Vec<JobDefinition> {
    vec![
        JobDefinition::new("frontal", "Frontal", "full frontal view"),
        JobDefinition::new("profile", "Profile", "side profile view"),
        JobDefinition::new("low-angle", "Low Angle", "dramatic low angle shot"),
        JobDefinition::new("high-angle", "High Angle", "chic high angle from above"),
        JobDefinition::new("details", "Details", "high-fashion torso close-up"),
    ]
}

pub fn embedded_images(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| format!("data:image/png;base64,UPLOAD{}", i))
        .collect()
}

/// A `generateContent` response carrying one image
pub fn image_response(data: &str) -> Value {
    json!({
        "candidates": [{
            "content": {
                "parts": [
                    { "text": "Here is the look." },
                    { "inlineData": { "mimeType": "image/png", "data": data } }
                ]
            }
        }]
    })
}

type Hook = Box<dyn Fn(usize) + Send + Sync>;

/// Backend that answers from a script instead of the network
pub struct ScriptedBackend {
    fail_on: HashSet<usize>,
    calls: AtomicUsize,
    payloads: Mutex<Vec<GeneratePayload>>,
    hook: Option<Hook>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self {
            fail_on: HashSet::new(),
            calls: AtomicUsize::new(0),
            payloads: Mutex::new(Vec::new()),
            hook: None,
        }
    }

    /// Fail the calls with these zero-based indices
    pub fn failing_on(mut self, calls: &[usize]) -> Self {
        self.fail_on = calls.iter().copied().collect();
        self
    }

    /// Run `hook` with the call index before answering
    pub fn with_hook(mut self, hook: impl Fn(usize) + Send + Sync + 'static) -> Self {
        self.hook = Some(Box::new(hook));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn payloads(&self) -> Vec<GeneratePayload> {
        self.payloads.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }

    async fn generate(&self, payload: &GeneratePayload) -> Result<ReferenceImage> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        self.payloads.lock().unwrap().push(payload.clone());

        if let Some(hook) = &self.hook {
            hook(index);
        }

        if self.fail_on.contains(&index) {
            return Err(AppError::ServerRejected {
                status: 400,
                message: format!("scripted failure {}", index),
            });
        }

        Ok(ReferenceImage::new("image/png", format!("IMG{}", index)))
    }
}
