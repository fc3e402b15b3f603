//! HTTP client for the Gemini `generateContent` endpoint

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::backend::retry::RetryPolicy;
use crate::backend::traits::GenerationBackend;
use crate::config::GenerationConfig;
use crate::error::{AppError, Result};
use crate::generation::{extract_image, GeneratePayload};
use crate::image::ReferenceImage;

/// Image generation backend talking to a single Gemini model
pub struct GeminiBackend {
    client: Client,
    api_base: String,
    model: String,
    api_key: Option<String>,
    retry: RetryPolicy,
}

/// Error body returned by the endpoint on failure
#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: Option<String>,
}

impl GeminiBackend {
    /// Create a new backend from configuration
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.credential().map(str::to_string),
            retry: config.retry_policy(),
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    fn endpoint(&self) -> String {
        let model = self.model.trim();
        let model_path = if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{}", model)
        };
        format!("{}/{}:generateContent", self.api_base, model_path)
    }

    /// One POST, classified into success, retryable, or permanent failure
    async fn send_once(
        &self,
        endpoint: &str,
        api_key: &str,
        payload: &GeneratePayload,
        attempt: u32,
    ) -> Result<Value> {
        debug!(model = %self.model, attempt = attempt + 1, "Sending generateContent request");

        let response = self
            .client
            .post(endpoint)
            .query(&[("key", api_key)])
            .json(payload)
            .send()
            .await
            .map_err(AppError::transport)?;

        let status = response.status();
        let body = response.text().await.map_err(AppError::transport)?;

        if status.is_success() {
            return serde_json::from_str(&body).map_err(|e| {
                AppError::InvalidResponse(format!("Failed to parse response: {}", e))
            });
        }

        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            warn!(
                model = %self.model,
                attempt = attempt + 1,
                status = status.as_u16(),
                body = %body,
                "Generation endpoint returned a transient error"
            );
            return Err(AppError::RetryableServer {
                status: status.as_u16(),
            });
        }

        Err(AppError::ServerRejected {
            status: status.as_u16(),
            message: rejection_message(status, &body),
        })
    }
}

/// Server-provided `error.message`, or the status line when there is none
fn rejection_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.error)
        .and_then(|detail| detail.message)
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| status.to_string())
}

#[async_trait]
impl GenerationBackend for GeminiBackend {
    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, payload: &GeneratePayload) -> Result<ReferenceImage> {
        let api_key = self.api_key.as_deref().ok_or(AppError::MissingCredential)?;
        let endpoint = self.endpoint();

        let raw = self
            .retry
            .execute("generateContent", |attempt| {
                self.send_once(&endpoint, api_key, payload, attempt)
            })
            .await?;

        extract_image(&raw)
    }
}
