use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, error};

/// A video counts as watched once this many minutes have accumulated
pub const WATCHED_THRESHOLD_MINUTES: f64 = 1.0;

const HISTORY_FILE: &str = "watch_history.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WatchStatus {
    InProgress,
    Completed,
}

/// Watch state for a single video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchRecord {
    /// Set on the first visit, never overwritten
    pub started_at: DateTime<Utc>,
    pub last_watched_at: DateTime<Utc>,
    pub minutes_watched: f64,
    pub status: WatchStatus,
}

impl WatchRecord {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            started_at: now,
            last_watched_at: now,
            minutes_watched: 0.0,
            status: WatchStatus::InProgress,
        }
    }

    pub fn is_watched(&self) -> bool {
        self.minutes_watched >= WATCHED_THRESHOLD_MINUTES
    }
}

/// Flat mapping from video id to its record, serialized as a single JSON object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WatchHistory {
    entries: BTreeMap<String, WatchRecord>,
}

impl WatchHistory {
    pub fn get(&self, video_id: &str) -> Option<&WatchRecord> {
        self.entries.get(video_id)
    }

    /// Get the record for a video, creating a fresh one if none exists.
    /// Returns whether a record was created.
    pub fn get_or_create(&mut self, video_id: &str, now: DateTime<Utc>) -> (&mut WatchRecord, bool) {
        let created = !self.entries.contains_key(video_id);
        let record = self
            .entries
            .entry(video_id.to_string())
            .or_insert_with(|| WatchRecord::new(now));
        (record, created)
    }

    pub fn is_watched(&self, video_id: &str) -> bool {
        self.entries.get(video_id).is_some_and(WatchRecord::is_watched)
    }

    pub fn watched_count(&self) -> usize {
        self.entries.values().filter(|r| r.is_watched()).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &WatchRecord)> {
        self.entries.iter()
    }

    fn decode(raw: &str) -> Self {
        match serde_json::from_str(raw) {
            Ok(history) => history,
            Err(e) => {
                error!("failed to parse watch history: {}", e);
                Self::default()
            }
        }
    }

    fn encode(&self) -> Option<String> {
        match serde_json::to_string(self) {
            Ok(contents) => Some(contents),
            Err(e) => {
                error!("failed to serialize watch history: {}", e);
                None
            }
        }
    }
}

/// Persistence backend for watch history.
///
/// Every method fails soft: a broken backend reads as empty history and
/// drops writes, it never surfaces an error to the caller.
pub trait WatchStore: Send + Sync {
    fn load(&self) -> WatchHistory;

    /// Replace the whole persisted mapping
    fn save(&self, history: &WatchHistory);

    /// Remove the persisted entry entirely
    fn clear(&self);
}

/// Watch history stored as one JSON file on disk
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "cinemahub").map(|dirs| dirs.data_dir().join(HISTORY_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl WatchStore for FileStore {
    fn load(&self) -> WatchHistory {
        if !self.path.exists() {
            return WatchHistory::default();
        }

        match std::fs::read_to_string(&self.path) {
            Ok(contents) => {
                let history = WatchHistory::decode(&contents);
                debug!(entries = history.len(), "loaded watch history");
                history
            }
            Err(e) => {
                error!("failed to read watch history: {}", e);
                WatchHistory::default()
            }
        }
    }

    fn save(&self, history: &WatchHistory) {
        if let Some(parent) = self.path.parent()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            error!("failed to create history directory: {}", e);
            return;
        }

        let Some(contents) = history.encode() else {
            return;
        };

        if let Err(e) = std::fs::write(&self.path, contents) {
            error!("failed to write watch history: {}", e);
        }
    }

    fn clear(&self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "watch history cleared"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => error!("failed to remove watch history: {}", e),
        }
    }
}

/// In-process store holding the serialized history text
#[derive(Debug, Default)]
pub struct MemoryStore {
    slot: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with raw persisted text, which need not be valid JSON
    pub fn with_contents(raw: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(raw.into())),
        }
    }

    /// Raw persisted text, `None` when nothing is stored
    pub fn contents(&self) -> Option<String> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl WatchStore for MemoryStore {
    fn load(&self) -> WatchHistory {
        let slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        slot.as_deref().map(WatchHistory::decode).unwrap_or_default()
    }

    fn save(&self, history: &WatchHistory) {
        if let Some(contents) = history.encode() {
            *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(contents);
        }
    }

    fn clear(&self) {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }
}
