//! Read side of run state for the presentation layer

use tokio::sync::watch;

use crate::run::state::RunState;

/// Latest published [`RunState`]
///
/// Only the sequencer publishes; everyone else reads snapshots or subscribes.
pub struct ResultStore {
    tx: watch::Sender<Option<RunState>>,
}

impl ResultStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// Copy of the current run, if any run has started
    pub fn snapshot(&self) -> Option<RunState> {
        self.tx.borrow().clone()
    }

    /// Receive every published transition
    pub fn subscribe(&self) -> watch::Receiver<Option<RunState>> {
        self.tx.subscribe()
    }

    pub fn is_active(&self) -> bool {
        self.tx
            .borrow()
            .as_ref()
            .map(|state| state.is_active)
            .unwrap_or(false)
    }

    /// Install a new run unless one is still active
    pub(crate) fn try_begin(&self, state: RunState) -> bool {
        self.tx.send_if_modified(|current| {
            if current.as_ref().map(|run| run.is_active).unwrap_or(false) {
                return false;
            }
            *current = Some(state);
            true
        })
    }

    pub(crate) fn publish(&self, state: RunState) {
        self.tx.send_replace(Some(state));
    }
}

impl Default for ResultStore {
    fn default() -> Self {
        Self::new()
    }
}
