use std::sync::Arc;

use chrono::Duration;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use quiz_core::Clock;

use crate::backend::{BackendError, StorageBackend};

/// Namespace used when callers do not specify one.
pub const DEFAULT_NAMESPACE: &str = "quiz-cache";

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

/// Errors raised by the explicit (`try_*`) cache operations.
///
/// The convenience API absorbs these into miss/`false`; cache failures must
/// never cascade into test-taking failures.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CacheError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

//
// ─── ENVELOPE ─────────────────────────────────────────────────────────────────
//

/// Persisted envelope around a cached value.
///
/// An entry is logically absent once `now - timestamp > ttl_ms`; expired
/// entries are deleted lazily on read, there is no background sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub data: T,
    /// Creation time, epoch milliseconds.
    pub timestamp: i64,
    pub ttl_ms: i64,
}

impl<T> CacheEntry<T> {
    #[must_use]
    pub fn is_expired(&self, now_millis: i64) -> bool {
        now_millis - self.timestamp > self.ttl_ms
    }
}

/// Counters reported by [`CacheService::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub total_keys: usize,
    /// Sum of serialized envelope sizes, in bytes.
    pub total_size: usize,
}

//
// ─── CACHE SERVICE ────────────────────────────────────────────────────────────
//

/// Namespaced, TTL-aware key-value cache over a pluggable backend.
///
/// Keys are composed as `"<namespace>:<key>"`. The `try_*` methods surface
/// `CacheError`; the unprefixed methods are the fail-soft layer the session
/// flow uses, logging failures and degrading to a miss.
#[derive(Clone)]
pub struct CacheService {
    backend: Arc<dyn StorageBackend>,
    clock: Clock,
}

impl CacheService {
    #[must_use]
    pub fn new(backend: Arc<dyn StorageBackend>, clock: Clock) -> Self {
        Self { backend, clock }
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    fn compose_key(key: &str, namespace: Option<&str>) -> String {
        format!("{}:{key}", namespace.unwrap_or(DEFAULT_NAMESPACE))
    }

    /// Store a value with the given TTL.
    ///
    /// # Errors
    ///
    /// Returns `CacheError` if serialization or the backend write fails.
    pub fn try_set<T: Serialize>(
        &self,
        key: &str,
        data: &T,
        ttl: Duration,
        namespace: Option<&str>,
    ) -> Result<(), CacheError> {
        let entry = CacheEntry {
            data,
            timestamp: self.clock.now_millis(),
            ttl_ms: ttl.num_milliseconds(),
        };
        let raw = serde_json::to_string(&entry)?;
        self.backend.write(&Self::compose_key(key, namespace), &raw)?;
        Ok(())
    }

    /// Fetch a value, applying lazy expiry.
    ///
    /// An expired entry is deleted and reported as absent.
    ///
    /// # Errors
    ///
    /// Returns `CacheError` if the backend read or deserialization fails.
    pub fn try_get<T: DeserializeOwned>(
        &self,
        key: &str,
        namespace: Option<&str>,
    ) -> Result<Option<T>, CacheError> {
        let composed = Self::compose_key(key, namespace);
        let Some(raw) = self.backend.read(&composed)? else {
            return Ok(None);
        };
        let entry: CacheEntry<T> = serde_json::from_str(&raw)?;
        if entry.is_expired(self.clock.now_millis()) {
            self.backend.remove(&composed)?;
            return Ok(None);
        }
        Ok(Some(entry.data))
    }

    /// Remove a key; returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns `CacheError` if the backend write fails.
    pub fn try_delete(&self, key: &str, namespace: Option<&str>) -> Result<bool, CacheError> {
        Ok(self.backend.remove(&Self::compose_key(key, namespace))?)
    }

    /// Remove every key under `namespace`.
    ///
    /// # Errors
    ///
    /// Returns `CacheError` if the backend cannot be enumerated or written.
    pub fn try_clear_namespace(&self, namespace: &str) -> Result<usize, CacheError> {
        let prefix = format!("{namespace}:");
        let mut removed = 0;
        for key in self.backend.keys()? {
            if key.starts_with(&prefix) && self.backend.remove(&key)? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Raw keys under a namespace (without the prefix stripped).
    ///
    /// # Errors
    ///
    /// Returns `CacheError` if the backend cannot be enumerated.
    pub fn try_keys_in_namespace(&self, namespace: &str) -> Result<Vec<String>, CacheError> {
        let prefix = format!("{namespace}:");
        Ok(self
            .backend
            .keys()?
            .into_iter()
            .filter(|k| k.starts_with(&prefix))
            .collect())
    }

    // ─── Fail-soft convenience layer ──────────────────────────────────────

    /// Store a value; `false` on any failure (logged, never thrown).
    pub fn set<T: Serialize>(
        &self,
        key: &str,
        data: &T,
        ttl: Duration,
        namespace: Option<&str>,
    ) -> bool {
        match self.try_set(key, data, ttl, namespace) {
            Ok(()) => true,
            Err(error) => {
                warn!(%key, %error, "cache set failed");
                false
            }
        }
    }

    /// Fetch a value; failures and expired entries are both misses.
    pub fn get<T: DeserializeOwned>(&self, key: &str, namespace: Option<&str>) -> Option<T> {
        match self.try_get(key, namespace) {
            Ok(value) => value,
            Err(error) => {
                warn!(%key, %error, "cache get failed");
                None
            }
        }
    }

    /// Remove a key; `false` if absent or on failure.
    pub fn delete(&self, key: &str, namespace: Option<&str>) -> bool {
        match self.try_delete(key, namespace) {
            Ok(existed) => existed,
            Err(error) => {
                warn!(%key, %error, "cache delete failed");
                false
            }
        }
    }

    /// True when a live (non-expired) entry exists.
    pub fn has(&self, key: &str, namespace: Option<&str>) -> bool {
        self.get::<serde_json::Value>(key, namespace).is_some()
    }

    /// Drop a whole namespace; `false` on failure.
    pub fn clear_namespace(&self, namespace: &str) -> bool {
        match self.try_clear_namespace(namespace) {
            Ok(_) => true,
            Err(error) => {
                warn!(%namespace, %error, "cache clear_namespace failed");
                false
            }
        }
    }

    /// Counts across every namespace; empty stats on failure.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let keys = match self.backend.keys() {
            Ok(keys) => keys,
            Err(error) => {
                warn!(%error, "cache stats failed");
                return CacheStats::default();
            }
        };
        let mut stats = CacheStats {
            total_keys: keys.len(),
            total_size: 0,
        };
        for key in keys {
            if let Ok(Some(raw)) = self.backend.read(&key) {
                stats.total_size += raw.len();
            }
        }
        stats
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
