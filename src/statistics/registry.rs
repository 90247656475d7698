//! Per-path and per-recording hit counters.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};
use serde::Serialize;

use crate::recording::{RecordingId, RecordingStore};

#[derive(Debug, Default)]
struct CounterTables {
    by_path: HashMap<String, u64>,
    by_recording: HashMap<RecordingId, u64>,
}

/// A consistent view of both counter tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatisticsSnapshot {
    pub per_path: BTreeMap<String, u64>,
    pub per_recording: BTreeMap<String, u64>,
}

/// Hit counters for one server instance.
///
/// A single lock guards both tables, so a hit is never visible in one table
/// without the other and a reset orders strictly before or after every hit.
#[derive(Debug, Default)]
pub struct StatisticsRegistry {
    tables: Mutex<CounterTables>,
}

impl StatisticsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with every recording and exact path of the store at zero.
    pub fn for_store(store: &RecordingStore) -> Self {
        let registry = Self::new();
        {
            let mut tables = registry.lock();
            for id in store.ids() {
                tables.by_recording.insert(id.clone(), 0);
            }
            for path in store.known_paths() {
                tables.by_path.insert(path.to_string(), 0);
            }
        }
        registry
    }

    fn lock(&self) -> MutexGuard<'_, CounterTables> {
        // Poisoning is ignored: the tables only ever hold plain counts.
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Count one served request for `path` answered by `recording`.
    pub fn record_hit(&self, path: &str, recording: &RecordingId) {
        let mut guard = self.lock();
        let tables = &mut *guard;

        match tables.by_path.get_mut(path) {
            Some(count) => *count = count.saturating_add(1),
            None => {
                tables.by_path.insert(path.to_string(), 1);
            }
        }

        let count = tables.by_recording.entry(recording.clone()).or_insert(0);
        *count = count.saturating_add(1);
    }

    /// Snapshot of the by-path table.
    pub fn path_counts(&self) -> BTreeMap<String, u64> {
        self.lock()
            .by_path
            .iter()
            .map(|(path, count)| (path.clone(), *count))
            .collect()
    }

    /// Snapshot of the by-recording table.
    pub fn recording_counts(&self) -> BTreeMap<String, u64> {
        self.lock()
            .by_recording
            .iter()
            .map(|(id, count)| (id.to_string(), *count))
            .collect()
    }

    /// Snapshot of both tables taken under the same lock.
    pub fn snapshot(&self) -> StatisticsSnapshot {
        let tables = self.lock();
        StatisticsSnapshot {
            per_path: tables
                .by_path
                .iter()
                .map(|(path, count)| (path.clone(), *count))
                .collect(),
            per_recording: tables
                .by_recording
                .iter()
                .map(|(id, count)| (id.to_string(), *count))
                .collect(),
        }
    }

    /// Zero every known counter. Keys stay visible.
    pub fn reset(&self) {
        let mut tables = self.lock();
        tables.by_path.values_mut().for_each(|count| *count = 0);
        tables.by_recording.values_mut().for_each(|count| *count = 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::parse_recording;
    use std::sync::Arc;
    use std::thread;

    fn id(name: &str) -> RecordingId {
        RecordingId::new(name)
    }

    #[test]
    fn test_record_hit_updates_both_tables() {
        let registry = StatisticsRegistry::new();
        registry.record_hit("/samepath", &id("request_same_path1.troxy"));
        registry.record_hit("/samepath", &id("request_same_path1.troxy"));
        registry.record_hit("/samepath", &id("request_same_path2.troxy"));
        registry.record_hit("/differentpath", &id("request_different_path.troxy"));

        let paths = registry.path_counts();
        assert_eq!(paths["/samepath"], 3);
        assert_eq!(paths["/differentpath"], 1);

        let recordings = registry.recording_counts();
        assert_eq!(recordings["request_same_path1.troxy"], 2);
        assert_eq!(recordings["request_same_path2.troxy"], 1);
        assert_eq!(recordings["request_different_path.troxy"], 1);
    }

    #[test]
    fn test_reset_keeps_keys_at_zero() {
        let registry = StatisticsRegistry::new();
        registry.record_hit("/a", &id("a.troxy"));
        registry.record_hit("/b", &id("b.troxy"));

        registry.reset();
        let first = registry.snapshot();
        assert_eq!(first.per_path.get("/a"), Some(&0));
        assert_eq!(first.per_path.get("/b"), Some(&0));
        assert_eq!(first.per_recording.get("a.troxy"), Some(&0));
        assert_eq!(first.per_recording.get("b.troxy"), Some(&0));

        registry.reset();
        assert_eq!(registry.snapshot(), first);

        registry.record_hit("/a", &id("a.troxy"));
        assert_eq!(registry.path_counts()["/a"], 1);
    }

    #[test]
    fn test_for_store_preregisters_known_keys() {
        let recordings = vec![
            parse_recording(id("exact.troxy"), "[request]\npath = \"/exact\"").unwrap(),
            parse_recording(id("prefix.troxy"), "[request]\npath_prefix = \"/api\"").unwrap(),
        ];
        let store = RecordingStore::from_recordings(recordings).unwrap();
        let registry = StatisticsRegistry::for_store(&store);

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.per_path.len(), 1);
        assert_eq!(snapshot.per_path["/exact"], 0);
        assert_eq!(snapshot.per_recording["exact.troxy"], 0);
        assert_eq!(snapshot.per_recording["prefix.troxy"], 0);
    }

    #[test]
    fn test_concurrent_hits_are_all_counted() {
        let registry = Arc::new(StatisticsRegistry::new());
        let threads = 8;
        let hits_per_thread = 1_000;

        let handles: Vec<_> = (0..threads)
            .map(|t| {
                let registry = registry.clone();
                thread::spawn(move || {
                    let recording = id(if t % 2 == 0 { "even.troxy" } else { "odd.troxy" });
                    for _ in 0..hits_per_thread {
                        registry.record_hit("/shared", &recording);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.per_path["/shared"], (threads * hits_per_thread) as u64);
        assert_eq!(
            snapshot.per_recording["even.troxy"] + snapshot.per_recording["odd.troxy"],
            snapshot.per_path["/shared"]
        );
    }

    #[test]
    fn test_reset_during_hits_preserves_sum_invariant() {
        let registry = Arc::new(StatisticsRegistry::new());

        let writers: Vec<_> = (0..4)
            .map(|t| {
                let registry = registry.clone();
                thread::spawn(move || {
                    let recording = id(&format!("r{}.troxy", t));
                    for _ in 0..2_000 {
                        registry.record_hit("/p", &recording);
                    }
                })
            })
            .collect();

        for _ in 0..50 {
            registry.reset();
            let snapshot = registry.snapshot();
            let sum: u64 = snapshot.per_recording.values().sum();
            assert_eq!(snapshot.per_path.get("/p").copied().unwrap_or(0), sum);
        }

        for writer in writers {
            writer.join().unwrap();
        }

        let snapshot = registry.snapshot();
        let sum: u64 = snapshot.per_recording.values().sum();
        assert_eq!(snapshot.per_path["/p"], sum);
    }
}
