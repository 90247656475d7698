//! Immutable recording store.
//!
//! # Responsibilities
//! - Load every configured source, failing on the first bad one
//! - Reject duplicate identities
//! - Fix the precedence order used for tie-breaking
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Precedence: higher `priority` first, then load order
//! - Sorting is stable, so equal priorities keep their configured order

use std::cmp::Reverse;
use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use crate::recording::format::load_recording;
use crate::recording::model::{Recording, RecordingId};
use crate::recording::LoadError;

/// The loaded recordings, in precedence order.
#[derive(Debug, Default)]
pub struct RecordingStore {
    recordings: Vec<Recording>,
}

impl RecordingStore {
    /// Load recordings from an ordered list of sources.
    pub fn load<I, P>(sources: I) -> Result<Self, LoadError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut recordings = Vec::new();
        for source in sources {
            let recording = load_recording(source.as_ref())?;
            tracing::debug!(
                recording = %recording.id,
                source = %recording.source.display(),
                priority = recording.priority,
                "Recording loaded"
            );
            recordings.push(recording);
        }

        let store = Self::from_recordings(recordings)?;
        tracing::info!(count = store.len(), "Recording store ready");
        Ok(store)
    }

    /// Build a store from already parsed recordings, in load order.
    pub fn from_recordings(mut recordings: Vec<Recording>) -> Result<Self, LoadError> {
        let mut seen = HashSet::new();
        for (index, recording) in recordings.iter_mut().enumerate() {
            if !seen.insert(recording.id.clone()) {
                return Err(LoadError::DuplicateIdentity {
                    id: recording.id.to_string(),
                    path: recording.source.clone(),
                });
            }
            recording.load_index = index;
        }

        recordings.sort_by_key(|r| Reverse(r.priority));

        Ok(Self { recordings })
    }

    /// Iterate recordings in precedence order.
    pub fn iter(&self) -> impl Iterator<Item = &Recording> {
        self.recordings.iter()
    }

    /// Look up a recording by identity.
    pub fn get(&self, id: &str) -> Option<&Recording> {
        self.recordings.iter().find(|r| r.id.as_str() == id)
    }

    pub fn len(&self) -> usize {
        self.recordings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recordings.is_empty()
    }

    /// Identities of all loaded recordings.
    pub fn ids(&self) -> impl Iterator<Item = &RecordingId> {
        self.recordings.iter().map(|r| &r.id)
    }

    /// Literal paths referenced by exact path predicates.
    pub fn known_paths(&self) -> BTreeSet<&str> {
        self.recordings
            .iter()
            .filter_map(|r| r.request.exact_path())
            .collect()
    }
}
