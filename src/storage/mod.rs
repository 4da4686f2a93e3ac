//! Storage abstractions for run state and exports.
//!
//! A run reads the novelty state once at start and writes it once at the
//! end, then writes the two plain-text exports.
//!
//! ## Directory Structure
//!
//! ```text
//! {data_dir}/
//! ├── state.json              # identity -> first-seen seconds
//! ├── last_results.txt        # all matches of the last run
//! └── last_new_results.txt    # new matches of the last run
//! ```

pub mod local;

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::CandidateId;

pub use local::LocalStorage;

/// Persisted mapping from candidate identity to first-seen timestamp.
///
/// Serialized as a flat JSON object with sorted keys and float seconds
/// since the epoch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoveltyState {
    entries: BTreeMap<CandidateId, f64>,
}

impl NoveltyState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &CandidateId) -> bool {
        self.entries.contains_key(id)
    }

    /// Record `id` unless already present; the first timestamp is kept.
    pub fn insert(&mut self, id: CandidateId, seen_at: f64) -> bool {
        if self.entries.contains_key(&id) {
            return false;
        }
        self.entries.insert(id, seen_at);
        true
    }

    pub fn first_seen(&self, id: &CandidateId) -> Option<f64> {
        self.entries.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Most recent first-seen timestamp.
    pub fn newest(&self) -> Option<f64> {
        self.entries.values().copied().reduce(f64::max)
    }
}

/// Seconds since the epoch as stored in the novelty state.
pub fn epoch_seconds(at: DateTime<Utc>) -> f64 {
    at.timestamp_millis() as f64 / 1000.0
}

/// Inverse of [`epoch_seconds`], for display.
pub fn from_epoch_seconds(seconds: f64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis((seconds * 1000.0).round() as i64)
}

/// Trait for run storage backends.
#[async_trait]
pub trait RunStorage: Send + Sync {
    /// Load the novelty state; `Ok(None)` when none was saved yet.
    ///
    /// An unreadable or corrupt state is a `StateError`.
    async fn load_state(&self) -> Result<Option<NoveltyState>>;

    /// Replace the persisted novelty state.
    async fn save_state(&self, state: &NoveltyState) -> Result<()>;

    /// Write one plain-text export under `name`.
    async fn write_export(&self, name: &str, content: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_timestamp_wins() {
        let mut state = NoveltyState::new();
        let id = CandidateId::of("https://x.test/jobs/1", "Facharzt KJPP");
        assert!(state.insert(id.clone(), 100.0));
        assert!(!state.insert(id.clone(), 200.0));
        assert_eq!(state.first_seen(&id), Some(100.0));
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn test_serializes_as_flat_sorted_map() {
        let mut state = NoveltyState::new();
        state.insert(CandidateId::of("https://x.test/b", "B"), 2.5);
        state.insert(CandidateId::of("https://x.test/a", "A"), 1.0);

        let json = serde_json::to_value(&state).unwrap();
        let map = json.as_object().unwrap();
        assert_eq!(map.len(), 2);
        assert!(map.keys().all(|k| k.len() == 24));

        let text = serde_json::to_string(&state).unwrap();
        let keys: Vec<&String> = map.keys().collect();
        let first = text.find(keys[0].as_str()).unwrap();
        let second = text.find(keys[1].as_str()).unwrap();
        assert!(first < second);

        let back: NoveltyState = serde_json::from_str(&text).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn test_newest() {
        let mut state = NoveltyState::new();
        assert_eq!(state.newest(), None);
        state.insert(CandidateId::of("a", "a"), 10.0);
        state.insert(CandidateId::of("b", "b"), 30.0);
        assert_eq!(state.newest(), Some(30.0));
    }

    #[test]
    fn test_epoch_seconds_round_trip() {
        let at = DateTime::from_timestamp(1_760_000_000, 250_000_000).unwrap();
        let secs = epoch_seconds(at);
        assert_eq!(secs, 1_760_000_000.25);
        assert_eq!(from_epoch_seconds(secs), Some(at));
    }
}
