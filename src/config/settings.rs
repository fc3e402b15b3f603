//! Application settings and configuration management

use crate::backend::retry::RetryPolicy;
use crate::error::{AppError, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

/// Placeholder replaced by a job's framing instruction
pub const INSTRUCTION_PLACEHOLDER: &str = "{instruction}";

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default = "default_jobs")]
    pub jobs: Vec<JobDefinition>,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Generation endpoint configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GenerationConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Credential appended to every request as the `key` query parameter
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_delay")]
    pub base_delay_ms: u64,
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
    #[serde(default = "default_prompt_template")]
    pub prompt_template: String,
    /// Number of upload slots offered to the user
    #[serde(default = "default_max_reference_images")]
    pub max_reference_images: usize,
}

fn default_api_base() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_model() -> String {
    "gemini-2.5-flash-image-preview".to_string()
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay() -> u64 {
    1000
}

fn default_timeout() -> u64 {
    120000
}

fn default_prompt_template() -> String {
    "Professional model wearing uploaded clothes, minimalist style, white background, {instruction}"
        .to_string()
}

fn default_max_reference_images() -> usize {
    4
}

impl GenerationConfig {
    /// Retry policy derived from the attempt and backoff settings
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.base_delay_ms))
    }

    /// Credential, if one is configured and non-blank
    pub fn credential(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            model: default_model(),
            api_key: None,
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay(),
            timeout_ms: default_timeout(),
            prompt_template: default_prompt_template(),
            max_reference_images: default_max_reference_images(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// One entry of the fixed, ordered lookbook
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDefinition {
    pub id: String,
    pub title: String,
    #[serde(alias = "framing_instruction", alias = "view")]
    pub framing_instruction: String,
}

impl JobDefinition {
    pub fn new(id: &str, title: &str, framing_instruction: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            framing_instruction: framing_instruction.to_string(),
        }
    }

    /// Render the prompt sent for this job
    pub fn prompt(&self, template: &str) -> String {
        template.replace(INSTRUCTION_PLACEHOLDER, &self.framing_instruction)
    }
}

fn default_jobs() -> Vec<JobDefinition> {
    vec![
        JobDefinition::new("frontal", "Frontal", "full frontal view"),
        JobDefinition::new("profile", "Profile", "side profile view"),
        JobDefinition::new("low-angle", "Low Angle", "dramatic low angle shot"),
        JobDefinition::new("high-angle", "High Angle", "chic high angle from above"),
        JobDefinition::new("details", "Details", "high-fashion torso close-up"),
    ]
}

impl Settings {
    /// Load settings from configuration files and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/default.toml")
    }

    /// Load settings from a specific configuration file path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut builder = Config::builder()
            // Start with default values
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("generation.max_attempts", 3)?
            .set_default("generation.base_delay_ms", 1000)?;

        // The conventional variable name seeds the credential; file and prefixed env still win
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            builder = builder.set_default("generation.api_key", key)?;
        }

        let config = builder
            // Load from configuration file
            .add_source(File::with_name(path.as_ref().to_str().unwrap_or("config/default")).required(false))
            // Override with environment variables (prefixed with ATELIER__)
            .add_source(
                Environment::with_prefix("ATELIER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        Ok(settings)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(invalid("Server port cannot be 0"));
        }

        if self.generation.max_attempts == 0 {
            return Err(invalid("generation.max_attempts must be at least 1"));
        }

        if self.generation.max_reference_images == 0 {
            return Err(invalid("generation.max_reference_images must be at least 1"));
        }

        if !self.generation.prompt_template.contains(INSTRUCTION_PLACEHOLDER) {
            return Err(invalid(format!(
                "generation.prompt_template must contain '{}'",
                INSTRUCTION_PLACEHOLDER
            )));
        }

        if self.jobs.is_empty() {
            return Err(invalid("At least one job must be configured"));
        }

        let mut seen = HashSet::new();
        for job in &self.jobs {
            if job.id.trim().is_empty() {
                return Err(invalid(format!("Job '{}' has an empty id", job.title)));
            }
            if !seen.insert(job.id.as_str()) {
                return Err(invalid(format!("Duplicate job id '{}'", job.id)));
            }
        }

        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> AppError {
    AppError::Config(config::ConfigError::Message(message.into()))
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            generation: GenerationConfig::default(),
            logging: LoggingConfig::default(),
            jobs: default_jobs(),
        }
    }
}
