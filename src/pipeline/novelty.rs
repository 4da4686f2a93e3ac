// src/pipeline/novelty.rs

//! Novelty tracking across runs.
//!
//! Loaded once per run and persisted once at the end. Neither direction is
//! fatal: an unreadable state starts empty (everything is reported once
//! more) and a failed save only risks re-reporting on the next run.

use crate::models::CandidateId;
use crate::storage::{NoveltyState, RunStorage};

/// In-memory view of the novelty state for one run.
#[derive(Debug, Default)]
pub struct NoveltyTracker {
    state: NoveltyState,
    recorded: usize,
}

impl NoveltyTracker {
    pub fn from_state(state: NoveltyState) -> Self {
        Self { state, recorded: 0 }
    }

    /// Load the persisted state, degrading to empty on any failure.
    pub async fn load(storage: &dyn RunStorage) -> Self {
        let state = match storage.load_state().await {
            Ok(Some(state)) => {
                log::info!("Loaded novelty state with {} identities", state.len());
                state
            }
            Ok(None) => {
                log::info!("No novelty state yet; starting empty");
                NoveltyState::new()
            }
            Err(e) => {
                log::warn!("Could not load novelty state, starting empty: {e}");
                NoveltyState::new()
            }
        };
        Self::from_state(state)
    }

    pub fn is_new(&self, id: &CandidateId) -> bool {
        !self.state.contains(id)
    }

    /// Record a first sighting. Returns false if the identity was known.
    pub fn record(&mut self, id: CandidateId, seen_at: f64) -> bool {
        let inserted = self.state.insert(id, seen_at);
        if inserted {
            self.recorded += 1;
        }
        inserted
    }

    /// Identities recorded during this run.
    pub fn recorded(&self) -> usize {
        self.recorded
    }

    #[cfg(test)]
    fn state(&self) -> &NoveltyState {
        &self.state
    }

    /// Persist the state; a failure is logged and reported as `false`.
    pub async fn persist(&self, storage: &dyn RunStorage) -> bool {
        match storage.save_state(&self.state).await {
            Ok(()) => true,
            Err(e) => {
                log::error!("Failed to persist novelty state: {e}");
                false
            }
        }
    }
}
