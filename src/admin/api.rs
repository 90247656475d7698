//! Statistics facade for embedders and the admin REST layer.

use std::collections::BTreeMap;
use std::sync::Arc;
use serde::Serialize;

use crate::recording::{Recording, RecordingStore};
use crate::routing::Predicate;
use crate::statistics::{StatisticsRegistry, StatisticsSnapshot};

/// Summary of a loaded recording, as listed by the admin API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordingSummary {
    pub id: String,
    pub source: String,
    pub priority: i32,
    pub load_index: usize,
    pub path: String,
    pub exact_path: bool,
    pub status: u16,
}

impl From<&Recording> for RecordingSummary {
    fn from(recording: &Recording) -> Self {
        let (path, exact_path) = recording
            .request
            .predicates()
            .iter()
            .find_map(|p| match p {
                Predicate::Path(m) => Some((m.pattern().to_string(), m.is_exact())),
                _ => None,
            })
            .unwrap_or_default();

        Self {
            id: recording.id.to_string(),
            source: recording.source.display().to_string(),
            priority: recording.priority,
            load_index: recording.load_index,
            path,
            exact_path,
            status: recording.response.status.as_u16(),
        }
    }
}

/// Read and reset access to one server's statistics.
///
/// Cheap to clone; every clone sees the same counters.
#[derive(Debug, Clone)]
pub struct ApiHandler {
    store: Arc<RecordingStore>,
    statistics: Arc<StatisticsRegistry>,
}

impl ApiHandler {
    pub fn new(store: Arc<RecordingStore>, statistics: Arc<StatisticsRegistry>) -> Self {
        Self { store, statistics }
    }

    /// Served requests per URL path since the last reset.
    pub fn request_counter_per_path(&self) -> BTreeMap<String, u64> {
        self.statistics.path_counts()
    }

    /// Served requests per recording since the last reset.
    pub fn request_counter_per_recording(&self) -> BTreeMap<String, u64> {
        self.statistics.recording_counts()
    }

    /// Both tables, read together.
    pub fn statistics(&self) -> StatisticsSnapshot {
        self.statistics.snapshot()
    }

    /// Zero both tables.
    pub fn reset_total_statistic_counter(&self) {
        self.statistics.reset();
        tracing::info!("Statistics reset");
    }

    /// Loaded recordings in precedence order.
    pub fn recordings(&self) -> Vec<RecordingSummary> {
        self.store.iter().map(RecordingSummary::from).collect()
    }

    pub fn recording_count(&self) -> usize {
        self.store.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{parse_recording, RecordingId};

    fn api() -> ApiHandler {
        let recordings = vec![
            parse_recording(RecordingId::new("a.troxy"), "[request]\npath = \"/a\"").unwrap(),
            parse_recording(
                RecordingId::new("b.troxy"),
                "priority = 3\n[request]\npath_prefix = \"/b\"\n[response]\nstatus = 500",
            )
            .unwrap(),
        ];
        let store = Arc::new(RecordingStore::from_recordings(recordings).unwrap());
        let statistics = Arc::new(StatisticsRegistry::for_store(&store));
        ApiHandler::new(store, statistics)
    }

    #[test]
    fn test_recordings_listed_in_precedence_order() {
        let summaries = api().recordings();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].id, "b.troxy");
        assert_eq!(summaries[0].path, "/b");
        assert!(!summaries[0].exact_path);
        assert_eq!(summaries[0].status, 500);
        assert_eq!(summaries[0].load_index, 1);
        assert_eq!(summaries[1].id, "a.troxy");
        assert!(summaries[1].exact_path);
    }

    #[test]
    fn test_clones_share_counters() {
        let api = api();
        let other = api.clone();
        other.statistics.record_hit("/a", &RecordingId::new("a.troxy"));

        assert_eq!(api.request_counter_per_path()["/a"], 1);
        assert_eq!(api.request_counter_per_recording()["a.troxy"], 1);

        api.reset_total_statistic_counter();
        assert_eq!(other.request_counter_per_path()["/a"], 0);
        assert_eq!(other.request_counter_per_recording()["a.troxy"], 0);
        assert_eq!(other.request_counter_per_recording()["b.troxy"], 0);
    }
}
