//! The daily log store.
//!
//! Holds the authoritative collection of [`DailyLog`]s, at most one per
//! date, ordered newest date first. Persistence goes through an injected
//! [`LogSink`] so the store itself never touches global state.

use crate::{snapshot, DailyLog, Error, Result};
use chrono::NaiveDate;
use std::path::PathBuf;

/// Key-value persistence for the serialized log collection
pub trait LogSink {
    /// Held for the duration of a read-modify-write
    type Guard;

    /// Exclude other writers until the guard is dropped
    fn lock(&self) -> Result<Self::Guard>;

    /// Read the persisted snapshot, `None` if nothing was ever written
    fn read_snapshot(&self) -> Result<Option<String>>;

    /// Replace the persisted snapshot
    fn write_snapshot(&mut self, snapshot: &str) -> Result<()>;

    /// Set an unreadable snapshot aside so the next write doesn't destroy it
    fn quarantine(&mut self) -> Result<()> {
        Ok(())
    }
}

/// File-backed sink with locking and atomic replacement
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    /// Create a new sink for the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl LogSink for JsonFileSink {
    type Guard = snapshot::WriteLock;

    fn lock(&self) -> Result<snapshot::WriteLock> {
        snapshot::WriteLock::acquire(&self.path)
    }

    fn read_snapshot(&self) -> Result<Option<String>> {
        snapshot::read_locked(&self.path)
    }

    fn write_snapshot(&mut self, contents: &str) -> Result<()> {
        snapshot::write_atomic(&self.path, contents)
    }

    fn quarantine(&mut self) -> Result<()> {
        if self.path.exists() {
            snapshot::quarantine(&self.path)?;
        }
        Ok(())
    }
}

/// In-memory sink, mostly for tests and embedding
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    pub snapshot: Option<String>,
}

impl LogSink for MemorySink {
    type Guard = ();

    fn lock(&self) -> Result<()> {
        Ok(())
    }

    fn read_snapshot(&self) -> Result<Option<String>> {
        Ok(self.snapshot.clone())
    }

    fn write_snapshot(&mut self, contents: &str) -> Result<()> {
        self.snapshot = Some(contents.to_string());
        Ok(())
    }
}

/// How the store's contents were obtained on open/reload
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Nothing persisted yet
    Fresh,
    /// Snapshot decoded with this many logs
    Loaded(usize),
    /// Snapshot was unreadable; the store started empty
    Recovered { reason: String },
}

/// Deduplicated, date-ordered collection of daily logs
pub struct LogStore<S: LogSink> {
    logs: Vec<DailyLog>,
    sink: S,
}

impl<S: LogSink> LogStore<S> {
    /// Reconstruct a store from a persisted snapshot
    ///
    /// Fails with [`Error::CorruptState`] if the snapshot can't be decoded;
    /// no partial state is kept.
    pub fn load(snapshot: &str, sink: S) -> Result<Self> {
        let logs = decode(snapshot)?;
        Ok(Self { logs, sink })
    }

    /// Open the store from its sink
    ///
    /// A missing snapshot gives an empty store. An unreadable one is
    /// quarantined, logged, and also gives an empty store.
    pub fn open(sink: S) -> (Self, LoadOutcome) {
        let mut store = Self {
            logs: Vec::new(),
            sink,
        };
        let outcome = store.reload();
        (store, outcome)
    }

    /// Replace the in-memory collection with the sink's current snapshot
    ///
    /// Never fails: anything unreadable leaves the store empty and is
    /// reported as [`LoadOutcome::Recovered`].
    pub fn reload(&mut self) -> LoadOutcome {
        match self.refresh() {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!("Unable to read saved logs: {}. Starting empty.", e);
                self.logs.clear();
                LoadOutcome::Recovered {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Reload, quarantining a corrupt snapshot but failing on read errors
    ///
    /// A snapshot that can't be read at all is left in place and the
    /// in-memory collection is unchanged.
    fn refresh(&mut self) -> Result<LoadOutcome> {
        let Some(contents) = self.sink.read_snapshot()? else {
            tracing::info!("No saved logs, starting empty");
            self.logs.clear();
            return Ok(LoadOutcome::Fresh);
        };

        match decode(&contents) {
            Ok(logs) => {
                tracing::debug!("Loaded {} logs", logs.len());
                self.logs = logs;
                Ok(LoadOutcome::Loaded(self.logs.len()))
            }
            Err(e) => {
                tracing::warn!("Saved logs are corrupt: {}. Starting empty.", e);
                if let Err(qe) = self.sink.quarantine() {
                    tracing::warn!("Failed to set aside unreadable logs: {}", qe);
                }
                self.logs.clear();
                Ok(LoadOutcome::Recovered {
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Insert a log, replacing any existing log for the same date
    pub fn upsert(&mut self, log: DailyLog) {
        let before = self.logs.len();
        self.logs.retain(|existing| existing.date != log.date);
        if self.logs.len() < before {
            tracing::info!("Replacing existing log for {}", log.date);
        }
        self.logs.push(log);
        sort_newest_first(&mut self.logs);
    }

    /// All logs, newest date first
    pub fn all(&self) -> &[DailyLog] {
        &self.logs
    }

    /// The log recorded for a date, if any
    pub fn get(&self, date: NaiveDate) -> Option<&DailyLog> {
        self.logs.iter().find(|log| log.date == date)
    }

    pub fn len(&self) -> usize {
        self.logs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logs.is_empty()
    }

    /// Write the full collection to the sink
    pub fn persist(&mut self) -> Result<()> {
        let contents = serde_json::to_string(&self.logs)?;
        self.sink.write_snapshot(&contents)?;
        tracing::debug!("Persisted {} logs", self.logs.len());
        Ok(())
    }

    /// Upsert then persist, so the snapshot reflects this upsert
    pub fn upsert_and_persist(&mut self, log: DailyLog) -> Result<()> {
        self.upsert(log);
        self.persist()
    }

    /// Reload, upsert and persist while holding the sink's write lock
    ///
    /// Logs other writers persisted since this store was opened are kept.
    /// An unreadable (not corrupt) snapshot aborts the write instead of
    /// being replaced.
    pub fn merge_and_persist(&mut self, log: DailyLog) -> Result<LoadOutcome> {
        let _guard = self.sink.lock()?;
        let outcome = self.refresh()?;
        self.upsert_and_persist(log)?;
        Ok(outcome)
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

fn decode(snapshot: &str) -> Result<Vec<DailyLog>> {
    let mut logs: Vec<DailyLog> =
        serde_json::from_str(snapshot).map_err(|e| Error::CorruptState(e.to_string()))?;

    // A hand-edited snapshot may repeat a date; keep the newest write
    logs.sort_by(|a, b| b.date.cmp(&a.date).then(b.timestamp.cmp(&a.timestamp)));
    logs.dedup_by_key(|log| log.date);
    Ok(logs)
}

fn sort_newest_first(logs: &mut [DailyLog]) {
    logs.sort_by(|a, b| b.date.cmp(&a.date));
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{ExerciseEntry, NutritionData};
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    pub(crate) fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    pub(crate) fn make_log(day: &str, calories: f64, total_burned: f64) -> DailyLog {
        DailyLog {
            id: Uuid::now_v7(),
            date: date(day),
            raw_text: format!("entry for {}", day),
            intake: NutritionData {
                calories,
                protein: 80.0,
                fat: 60.0,
                carbs: 220.0,
                fiber: 20.0,
                sodium: 2300.0,
            },
            meals: vec![],
            exercise: vec![ExerciseEntry {
                description: "walk".into(),
                calories_burned: 150.0,
            }],
            total_burned,
            net_calories: calories - total_burned,
            notes: String::new(),
            suggestions: vec![],
            timestamp: Utc::now(),
        }
    }

    fn memory_store() -> LogStore<MemorySink> {
        LogStore::open(MemorySink::default()).0
    }

    #[test]
    fn test_upsert_same_date_keeps_latest() {
        let mut store = memory_store();
        store.upsert(make_log("2024-01-02", 1800.0, 1900.0));
        store.upsert(make_log("2024-01-02", 2500.0, 1900.0));

        assert_eq!(store.len(), 1);
        assert_eq!(store.all()[0].intake.calories, 2500.0);
    }

    #[test]
    fn test_all_sorted_newest_first() {
        let mut store = memory_store();
        store.upsert(make_log("2024-01-01", 2000.0, 1800.0));
        store.upsert(make_log("2024-01-03", 2000.0, 1800.0));
        store.upsert(make_log("2024-01-02", 2000.0, 1800.0));

        let dates: Vec<_> = store.all().iter().map(|l| l.date).collect();
        assert_eq!(
            dates,
            vec![date("2024-01-03"), date("2024-01-02"), date("2024-01-01")]
        );
    }

    #[test]
    fn test_get_by_date() {
        let mut store = memory_store();
        store.upsert(make_log("2024-01-01", 2000.0, 1800.0));

        assert!(store.get(date("2024-01-01")).is_some());
        assert!(store.get(date("2024-01-05")).is_none());
    }

    #[test]
    fn test_persist_then_load_roundtrip() {
        let mut store = memory_store();
        store.upsert_and_persist(make_log("2024-01-01", 2000.0, 1800.0)).unwrap();
        store.upsert_and_persist(make_log("2024-01-02", 1500.0, 1900.0)).unwrap();

        let snapshot = store.sink().snapshot.clone().unwrap();
        let loaded = LogStore::load(&snapshot, MemorySink::default()).unwrap();

        assert_eq!(loaded.all(), store.all());
    }

    #[test]
    fn test_load_corrupt_snapshot_fails() {
        let result = LogStore::load("{ not a list }", MemorySink::default());
        assert!(matches!(result, Err(Error::CorruptState(_))));
    }

    #[test]
    fn test_load_collapses_duplicate_dates() {
        let mut older = make_log("2024-01-01", 1000.0, 1800.0);
        older.timestamp = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
        let mut newer = make_log("2024-01-01", 3000.0, 1800.0);
        newer.timestamp = Utc.with_ymd_and_hms(2024, 1, 1, 21, 0, 0).unwrap();

        let snapshot = serde_json::to_string(&vec![newer, older]).unwrap();
        let store = LogStore::load(&snapshot, MemorySink::default()).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.all()[0].intake.calories, 3000.0);
    }

    #[test]
    fn test_open_recovers_from_corrupt_snapshot() {
        let sink = MemorySink {
            snapshot: Some("[{\"id\": 42}]".into()),
        };
        let (store, outcome) = LogStore::open(sink);

        assert!(store.is_empty());
        assert!(matches!(outcome, LoadOutcome::Recovered { .. }));
    }

    #[test]
    fn test_file_sink_roundtrip_and_quarantine() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("logs.json");

        let (mut store, outcome) = LogStore::open(JsonFileSink::new(&path));
        assert_eq!(outcome, LoadOutcome::Fresh);
        store.upsert_and_persist(make_log("2024-02-01", 2100.0, 1850.0)).unwrap();

        let (reopened, outcome) = LogStore::open(JsonFileSink::new(&path));
        assert_eq!(outcome, LoadOutcome::Loaded(1));
        assert_eq!(reopened.all(), store.all());

        std::fs::write(&path, "[{ truncated").unwrap();
        let (recovered, outcome) = LogStore::open(JsonFileSink::new(&path));
        assert!(recovered.is_empty());
        assert!(matches!(outcome, LoadOutcome::Recovered { .. }));
        assert!(temp_dir.path().join("logs.json.corrupt").exists());
    }

    #[test]
    fn test_reload_sees_other_writers() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("logs.json");

        let (mut first, _) = LogStore::open(JsonFileSink::new(&path));
        let (mut second, _) = LogStore::open(JsonFileSink::new(&path));

        first.upsert_and_persist(make_log("2024-03-01", 2000.0, 1800.0)).unwrap();

        assert_eq!(second.reload(), LoadOutcome::Loaded(1));
        second.upsert_and_persist(make_log("2024-03-02", 2000.0, 1800.0)).unwrap();

        let (merged, _) = LogStore::open(JsonFileSink::new(&path));
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_merge_keeps_logs_from_stale_store() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("logs.json");

        let (mut first, _) = LogStore::open(JsonFileSink::new(&path));
        let (mut second, _) = LogStore::open(JsonFileSink::new(&path));

        first.merge_and_persist(make_log("2024-03-01", 2000.0, 1800.0)).unwrap();
        let outcome = second.merge_and_persist(make_log("2024-03-02", 2000.0, 1800.0)).unwrap();

        assert_eq!(outcome, LoadOutcome::Loaded(1));
        let (merged, _) = LogStore::open(JsonFileSink::new(&path));
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_parallel_merges_keep_every_date() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("logs.json");

        let handles: Vec<_> = (1..=8)
            .map(|day| {
                let path = path.clone();
                std::thread::spawn(move || {
                    let (mut store, _) = LogStore::open(JsonFileSink::new(&path));
                    store
                        .merge_and_persist(make_log(&format!("2024-03-0{}", day), 2000.0, 1800.0))
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let (merged, outcome) = LogStore::open(JsonFileSink::new(&path));
        assert_eq!(outcome, LoadOutcome::Loaded(8));
        assert_eq!(merged.len(), 8);
    }

    #[test]
    fn test_merge_refuses_to_replace_unreadable_snapshot() {
        let temp_dir = tempfile::tempdir().unwrap();
        // A directory where the snapshot should be: reads fail with IO errors
        let path = temp_dir.path().join("logs.json");
        std::fs::create_dir(&path).unwrap();

        let (mut store, outcome) = LogStore::open(JsonFileSink::new(&path));
        assert!(matches!(outcome, LoadOutcome::Recovered { .. }));

        let result = store.merge_and_persist(make_log("2024-03-01", 2000.0, 1800.0));
        assert!(matches!(result, Err(Error::Io(_))));
        assert!(path.is_dir());
        assert!(!temp_dir.path().join("logs.json.corrupt").exists());
    }
}
