//! Virtual Atelier
//!
//! Turns up to four reference images into a fixed lookbook of AI-generated
//! images, one sequential and retried request per configured job.

pub mod api;
pub mod backend;
pub mod config;
pub mod error;
pub mod generation;
pub mod image;
pub mod run;

pub use error::{AppError, Result};

use std::sync::Arc;

use backend::GenerationBackend;
use run::JobSequencer;

/// Application state shared across all handlers
pub struct AppState {
    pub settings: Arc<config::Settings>,
    pub backend: Arc<dyn GenerationBackend>,
    pub sequencer: Arc<JobSequencer>,
}

impl AppState {
    pub fn new(settings: config::Settings, backend: Arc<dyn GenerationBackend>) -> Self {
        let sequencer = Arc::new(JobSequencer::from_settings(backend.clone(), &settings));
        Self {
            settings: Arc::new(settings),
            backend,
            sequencer,
        }
    }
}
