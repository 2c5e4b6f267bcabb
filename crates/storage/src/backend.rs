use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use thiserror::Error;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

/// Errors surfaced by storage backends.
///
/// The cache service absorbs these; callers above it only ever see a miss.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BackendError {
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt store: {0}")]
    Corrupt(String),
}

//
// ─── BACKEND CONTRACT ─────────────────────────────────────────────────────────
//

/// Synchronous string key-value store underneath the cache service.
///
/// Every operation is synchronous with respect to the calling event; the
/// subsystem has no background workers. Values are opaque serialized
/// envelopes; TTL semantics live one layer up in the cache service.
pub trait StorageBackend: Send + Sync {
    /// Fetch the raw value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the store cannot be read.
    fn read(&self, key: &str) -> Result<Option<String>, BackendError>;

    /// Store `value` under `key`, replacing any existing value.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the store cannot be written.
    fn write(&self, key: &str, value: &str) -> Result<(), BackendError>;

    /// Remove `key`; returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the store cannot be written.
    fn remove(&self, key: &str) -> Result<bool, BackendError>;

    /// All stored keys, in no particular order.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the store cannot be read.
    fn keys(&self) -> Result<Vec<String>, BackendError>;
}

//
// ─── IN-MEMORY BACKEND ────────────────────────────────────────────────────────
//

/// Simple in-memory backend for testing and ephemeral sessions.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, BackendError> {
        self.entries
            .lock()
            .map_err(|e| BackendError::Unavailable(e.to_string()))
    }
}

impl StorageBackend for MemoryBackend {
    fn read(&self, key: &str) -> Result<Option<String>, BackendError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), BackendError> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool, BackendError> {
        Ok(self.lock()?.remove(key).is_some())
    }

    fn keys(&self) -> Result<Vec<String>, BackendError> {
        Ok(self.lock()?.keys().cloned().collect())
    }
}

//
// ─── FILE BACKEND ─────────────────────────────────────────────────────────────
//

/// Persistent backend storing the whole key space as one JSON document.
///
/// Concurrent writers from other processes are not guarded: the last write
/// wins. A single process serializes access through the internal mutex.
pub struct FileBackend {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileBackend {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<HashMap<String, String>, BackendError> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let raw = fs::read_to_string(&self.path)?;
        if raw.trim().is_empty() {
            return Ok(HashMap::new());
        }
        serde_json::from_str(&raw).map_err(|e| BackendError::Corrupt(e.to_string()))
    }

    fn store(&self, entries: &HashMap<String, String>) -> Result<(), BackendError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string(entries)
            .map_err(|e| BackendError::Corrupt(e.to_string()))?;
        fs::write(&self.path, raw)?;
        Ok(())
    }

    fn guard(&self) -> Result<std::sync::MutexGuard<'_, ()>, BackendError> {
        self.lock
            .lock()
            .map_err(|e| BackendError::Unavailable(e.to_string()))
    }
}

impl StorageBackend for FileBackend {
    fn read(&self, key: &str) -> Result<Option<String>, BackendError> {
        let _guard = self.guard()?;
        Ok(self.load()?.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), BackendError> {
        let _guard = self.guard()?;
        let mut entries = self.load()?;
        entries.insert(key.to_string(), value.to_string());
        self.store(&entries)
    }

    fn remove(&self, key: &str) -> Result<bool, BackendError> {
        let _guard = self.guard()?;
        let mut entries = self.load()?;
        let existed = entries.remove(key).is_some();
        if existed {
            self.store(&entries)?;
        }
        Ok(existed)
    }

    fn keys(&self) -> Result<Vec<String>, BackendError> {
        let _guard = self.guard()?;
        Ok(self.load()?.keys().cloned().collect())
    }
}
