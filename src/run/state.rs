//! Run state: per-job results, progress, and status

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use uuid::Uuid;

use crate::config::JobDefinition;
use crate::image::ReferenceImage;

pub const STATUS_FINISHED: &str = "Finished";
pub const STATUS_CANCELLED: &str = "Cancelled";

/// Lifecycle of a single job within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Succeeded | JobState::Failed)
    }
}

/// Outcome of one job
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResult {
    pub title: String,
    pub state: JobState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<ReferenceImage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl JobResult {
    fn pending(title: &str) -> Self {
        Self {
            title: title.to_string(),
            state: JobState::Pending,
            image: None,
            error_message: None,
        }
    }
}

/// One orchestration session over a fixed set of reference images
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunState {
    pub session_id: Uuid,
    #[serde(skip_serializing)]
    pub reference_images: Vec<ReferenceImage>,
    /// Keyed by job id, in configured job order
    pub results: IndexMap<String, JobResult>,
    pub progress_percent: u8,
    pub status_message: String,
    pub is_active: bool,
    /// Uploads skipped because they were not valid embedded images
    pub dropped_images: usize,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunState {
    /// Fresh run with every job pending
    pub fn new(
        reference_images: Vec<ReferenceImage>,
        jobs: &[JobDefinition],
        dropped_images: usize,
    ) -> Self {
        let results = jobs
            .iter()
            .map(|job| (job.id.clone(), JobResult::pending(&job.title)))
            .collect();

        Self {
            session_id: Uuid::new_v4(),
            reference_images,
            results,
            progress_percent: 0,
            status_message: "Starting".to_string(),
            is_active: true,
            dropped_images,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn result(&self, job_id: &str) -> Option<&JobResult> {
        self.results.get(job_id)
    }

    /// Raise progress; lower values are ignored
    pub fn advance_progress(&mut self, percent: u8) {
        self.progress_percent = self.progress_percent.max(percent.min(100));
    }

    pub fn mark_running(&mut self, job_id: &str) -> bool {
        self.transition(job_id, |result| {
            if result.state != JobState::Pending {
                return false;
            }
            result.state = JobState::Running;
            true
        })
    }

    pub fn mark_succeeded(&mut self, job_id: &str, image: ReferenceImage) -> bool {
        self.transition(job_id, |result| {
            if result.state.is_terminal() {
                return false;
            }
            result.state = JobState::Succeeded;
            result.image = Some(image);
            true
        })
    }

    pub fn mark_failed(&mut self, job_id: &str, message: impl Into<String>) -> bool {
        let message = message.into();
        self.transition(job_id, |result| {
            if result.state.is_terminal() {
                return false;
            }
            result.state = JobState::Failed;
            result.error_message = Some(message);
            true
        })
    }

    fn transition(&mut self, job_id: &str, apply: impl FnOnce(&mut JobResult) -> bool) -> bool {
        self.results.get_mut(job_id).map(apply).unwrap_or(false)
    }

    /// Fail every job that has not reached a terminal state
    pub fn fail_unfinished(&mut self, message: &str) -> usize {
        let mut failed = 0;
        for result in self.results.values_mut() {
            if !result.state.is_terminal() {
                result.state = JobState::Failed;
                result.error_message = Some(message.to_string());
                failed += 1;
            }
        }
        failed
    }

    /// Close the run: full progress, final status, inactive
    pub fn finish(&mut self, status: &str) {
        self.progress_percent = 100;
        self.status_message = status.to_string();
        self.is_active = false;
        self.finished_at = Some(Utc::now());
    }

    pub fn is_complete(&self) -> bool {
        self.results.values().all(|result| result.state.is_terminal())
    }

    pub fn count(&self, state: JobState) -> usize {
        self.results.values().filter(|result| result.state == state).count()
    }
}

/// `floor(index / total * 100)`
pub fn progress_for(index: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    (index.min(total) * 100 / total) as u8
}
