//! Run orchestration - job sequencing and observable run state

pub mod sequencer;
pub mod state;
pub mod store;

pub use sequencer::{JobSequencer, PreparedRun};
pub use state::{JobResult, JobState, RunState};
pub use store::ResultStore;
