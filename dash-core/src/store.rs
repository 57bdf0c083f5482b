//! Persistent search history.
//!
//! History lives behind [`KeyValueStore`] so the dashboard can run against the
//! on-disk [`FileStore`] in production and a [`MemoryStore`] in tests.

use std::{
    collections::BTreeMap,
    fmt::Debug,
    fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::{debug, warn};

/// Storage key holding the JSON-encoded history array.
pub const HISTORY_KEY: &str = "weatherHistory";

/// Maximum number of cities kept in history.
pub const HISTORY_LIMIT: usize = 10;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to write storage file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode storage contents: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Minimal string key-value storage, scoped to one user.
pub trait KeyValueStore: Send + Sync + Debug {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Key-value store persisted as a single JSON object file.
///
/// The whole file is read once on [`FileStore::open`] and rewritten on every
/// mutation. A missing file is an empty store. A corrupt file is logged and
/// also treated as empty; it gets replaced on the next write.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!(path = %path.display(), %err, "storage file is corrupt, starting empty");
                BTreeMap::new()
            }),
            Err(err) if err.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => {
                warn!(path = %path.display(), %err, "failed to read storage file, starting empty");
                BTreeMap::new()
            }
        };

        Self { path, entries }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes `entries` to disk; the caller commits them only on success.
    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let write_err = |source| StoreError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let json = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, json).map_err(write_err)?;

        debug!(path = %self.path.display(), "storage flushed");
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        let mut entries = self.entries.clone();
        entries.insert(key.to_string(), value);
        self.flush(&entries)?;
        self.entries = entries;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if !self.entries.contains_key(key) {
            return Ok(());
        }

        let mut entries = self.entries.clone();
        entries.remove(key);
        self.flush(&entries)?;
        self.entries = entries;
        Ok(())
    }
}

/// Recency-ordered, case-insensitively unique list of searched cities.
#[derive(Debug)]
pub struct HistoryStore {
    store: Box<dyn KeyValueStore>,
}

impl HistoryStore {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Stored history, most recent first. Absent or unparsable values yield
    /// an empty list.
    pub fn load(&self) -> Vec<String> {
        let Some(raw) = self.store.get(HISTORY_KEY) else {
            return Vec::new();
        };

        serde_json::from_str(&raw).unwrap_or_else(|err| {
            warn!(%err, "stored history is not a string array, ignoring it");
            Vec::new()
        })
    }

    pub fn is_empty(&self) -> bool {
        self.load().is_empty()
    }

    /// Moves `city` to the front, dropping any other casing of it and
    /// anything past [`HISTORY_LIMIT`].
    pub fn record(&mut self, city: &str) -> Result<(), StoreError> {
        let needle = city.to_lowercase();

        let mut history = self.load();
        history.retain(|existing| existing.to_lowercase() != needle);
        history.insert(0, city.to_string());
        history.truncate(HISTORY_LIMIT);

        let encoded = serde_json::to_string(&history)?;
        self.store.set(HISTORY_KEY, encoded)
    }

    pub fn clear(&mut self) -> Result<(), StoreError> {
        self.store.remove(HISTORY_KEY)
    }
}
