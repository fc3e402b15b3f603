//! Configuration module

pub mod settings;

pub use settings::{GenerationConfig, JobDefinition, LoggingConfig, ServerConfig, Settings};
