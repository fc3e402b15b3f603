//! Sequential driver for the configured generation jobs

use parking_lot::Mutex;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::backend::GenerationBackend;
use crate::config::{JobDefinition, Settings};
use crate::error::{AppError, Result};
use crate::generation;
use crate::image::codec;
use crate::run::state::{progress_for, JobState, RunState, STATUS_CANCELLED, STATUS_FINISHED};
use crate::run::store::ResultStore;

const CANCELLED_MESSAGE: &str = "Run cancelled before this job started";
const ABANDONED_MESSAGE: &str = "Run stopped before this job finished";
const NO_IMAGES_MESSAGE: &str = "Please upload at least one image before generating.";

/// Runs every configured job, one at a time, against one set of images
pub struct JobSequencer {
    backend: Arc<dyn GenerationBackend>,
    jobs: Vec<JobDefinition>,
    prompt_template: String,
    max_reference_images: usize,
    store: Arc<ResultStore>,
    cancel: Mutex<Option<CancellationToken>>,
}

/// A run that passed validation and owns the active slot
///
/// Dropping it before [`JobSequencer::drive`] completes finishes the run with
/// the remaining jobs failed, so the store never stays active.
pub struct PreparedRun {
    state: RunState,
    cancel: CancellationToken,
    store: Arc<ResultStore>,
    completed: bool,
}

impl PreparedRun {
    pub fn session_id(&self) -> Uuid {
        self.state.session_id
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

impl Drop for PreparedRun {
    fn drop(&mut self) {
        if self.completed {
            return;
        }
        warn!(session_id = %self.state.session_id, "Run abandoned before completion");
        self.state.fail_unfinished(ABANDONED_MESSAGE);
        self.state.finish(STATUS_CANCELLED);
        self.store.publish(self.state.clone());
    }
}

impl JobSequencer {
    pub fn new(
        backend: Arc<dyn GenerationBackend>,
        jobs: Vec<JobDefinition>,
        prompt_template: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            jobs,
            prompt_template: prompt_template.into(),
            max_reference_images: usize::MAX,
            store: Arc::new(ResultStore::new()),
            cancel: Mutex::new(None),
        }
    }

    /// Sequencer for the configured jobs, template, and slot limit
    pub fn from_settings(backend: Arc<dyn GenerationBackend>, settings: &Settings) -> Self {
        Self::new(
            backend,
            settings.jobs.clone(),
            settings.generation.prompt_template.clone(),
        )
        .with_max_reference_images(settings.generation.max_reference_images)
    }

    pub fn with_max_reference_images(mut self, max: usize) -> Self {
        self.max_reference_images = max;
        self
    }

    pub fn jobs(&self) -> &[JobDefinition] {
        &self.jobs
    }

    pub fn store(&self) -> Arc<ResultStore> {
        self.store.clone()
    }

    pub fn is_active(&self) -> bool {
        self.store.is_active()
    }

    /// Validate the uploads and claim the active run slot
    ///
    /// Malformed embedded images are dropped and counted, not reported.
    pub fn prepare<S: AsRef<str>>(&self, embedded: &[S]) -> Result<PreparedRun> {
        let decoded = codec::decode_all(embedded);

        if decoded.images.is_empty() {
            warn!(dropped = decoded.dropped, "Rejected run without reference images");
            return Err(AppError::Validation(NO_IMAGES_MESSAGE.to_string()));
        }

        if decoded.images.len() > self.max_reference_images {
            return Err(AppError::Validation(format!(
                "At most {} reference images are supported, got {}",
                self.max_reference_images,
                decoded.images.len()
            )));
        }

        let state = RunState::new(decoded.images, &self.jobs, decoded.dropped);

        // Claiming the slot and installing its token happen under one lock
        let mut slot = self.cancel.lock();
        if !self.store.try_begin(state.clone()) {
            return Err(AppError::RunInProgress);
        }
        let cancel = CancellationToken::new();
        *slot = Some(cancel.clone());
        drop(slot);

        info!(
            session_id = %state.session_id,
            images = state.reference_images.len(),
            dropped = state.dropped_images,
            jobs = self.jobs.len(),
            "Prepared generation run"
        );

        Ok(PreparedRun {
            state,
            cancel,
            store: self.store.clone(),
            completed: false,
        })
    }

    /// Execute every job in order and return the final state
    pub async fn drive(&self, mut run: PreparedRun) -> RunState {
        let total = self.jobs.len();
        let session_id = run.state.session_id;
        let mut cancelled = false;

        for (index, job) in self.jobs.iter().enumerate() {
            if run.cancel.is_cancelled() {
                let skipped = run.state.fail_unfinished(CANCELLED_MESSAGE);
                warn!(session_id = %session_id, skipped = skipped, "Run cancelled");
                cancelled = true;
                break;
            }

            run.state.status_message = format!("Developing: {}", job.title);
            run.state.advance_progress(progress_for(index, total));
            run.state.mark_running(&job.id);
            self.store.publish(run.state.clone());

            let prompt = job.prompt(&self.prompt_template);
            let payload = generation::build(&prompt, &run.state.reference_images);

            match self.backend.generate(&payload).await {
                Ok(image) => {
                    info!(session_id = %session_id, job_id = %job.id, "Job succeeded");
                    run.state.mark_succeeded(&job.id, image);
                }
                Err(e) => {
                    error!(
                        session_id = %session_id,
                        job_id = %job.id,
                        error = %e,
                        "Job failed"
                    );
                    run.state.status_message = format!("Error generating {}", job.title);
                    run.state.mark_failed(&job.id, e.to_string());
                }
            }
            self.store.publish(run.state.clone());
        }

        run.state.finish(if cancelled { STATUS_CANCELLED } else { STATUS_FINISHED });
        run.completed = true;
        self.store.publish(run.state.clone());

        info!(
            session_id = %session_id,
            succeeded = run.state.count(JobState::Succeeded),
            failed = run.state.count(JobState::Failed),
            "Generation run finished"
        );

        run.state.clone()
    }

    /// Validate and drive a full run
    pub async fn run<S: AsRef<str>>(&self, embedded: &[S]) -> Result<RunState> {
        let prepared = self.prepare(embedded)?;
        Ok(self.drive(prepared).await)
    }

    /// Signal the active run to stop before its next job
    ///
    /// A request already in flight is left to finish.
    pub fn cancel(&self) -> bool {
        let slot = self.cancel.lock();
        if !self.store.is_active() {
            return false;
        }
        match slot.as_ref() {
            Some(token) => {
                token.cancel();
                info!("Cancellation requested for active run");
                true
            }
            None => false,
        }
    }
}
