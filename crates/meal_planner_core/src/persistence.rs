//! crates/meal_planner_core/src/persistence.rs
//!
//! The persistence adapter: JSON values over a `KeyValueStorage`.
//!
//! Persistence is best-effort. Nothing here returns an error to the caller;
//! failures are logged and reported to the configured `PersistenceObserver`,
//! and the in-memory state stays authoritative for the rest of the session.

use crate::observer::NullObserver;
use crate::ports::{KeyValueStorage, PersistenceEvent, PersistenceObserver, StorageError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, warn};

//=========================================================================================
// Storage Keys
//=========================================================================================

/// The storage keys the store owns. Every key under `prefix` other than
/// `version` counts as domain data and is purged on a version change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub prefix: String,
    pub profile: String,
    pub meal_plan: String,
    pub saved_recipes: String,
    pub version: String,
}

impl StorageKeys {
    pub const DEFAULT_PREFIX: &'static str = "mp_";

    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            profile: format!("{prefix}user_profile"),
            meal_plan: format!("{prefix}meal_plan"),
            saved_recipes: format!("{prefix}saved_recipes"),
            version: format!("{prefix}app_version"),
        }
    }

    /// The three entity keys.
    pub fn entity_keys(&self) -> [&str; 3] {
        [&self.profile, &self.meal_plan, &self.saved_recipes]
    }

    pub fn is_domain_key(&self, key: &str) -> bool {
        key != self.version && key.starts_with(&self.prefix)
    }
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self::with_prefix(Self::DEFAULT_PREFIX)
    }
}

//=========================================================================================
// Write Outcome
//=========================================================================================

/// What happened to a single `set` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    /// The value was `None` and the key was deleted.
    Removed,
    /// The first attempt hit the quota; the saved-recipes key was evicted and
    /// the retry succeeded.
    WrittenAfterEviction,
    /// The value never reached storage.
    Dropped,
}

//=========================================================================================
// The Adapter
//=========================================================================================

#[derive(Clone)]
pub struct PersistenceAdapter {
    storage: Arc<dyn KeyValueStorage>,
    observer: Arc<dyn PersistenceObserver>,
    keys: StorageKeys,
}

impl PersistenceAdapter {
    pub fn new(storage: Arc<dyn KeyValueStorage>, keys: StorageKeys) -> Self {
        Self {
            storage,
            observer: Arc::new(NullObserver),
            keys,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn PersistenceObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn keys(&self) -> &StorageKeys {
        &self.keys
    }

    /// Reads and decodes `key`, falling back to `default` when the key is
    /// absent or its content does not decode as `T`.
    pub fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        match self.read_value(key) {
            Some(value) => self.decode_or(key, value, default),
            None => default,
        }
    }

    /// Serializes and writes `value`, or deletes `key` when `value` is `None`.
    /// A delete the backend refuses counts as a dropped write.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: Option<&T>) -> WriteOutcome {
        let Some(value) = value else {
            if self.remove(key) {
                return WriteOutcome::Removed;
            }
            return self.drop_write(key, "failed to remove stored value".to_string());
        };

        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(e) => return self.drop_write(key, format!("failed to encode value: {e}")),
        };

        match self.storage.set_raw(key, &payload) {
            Ok(()) => {
                debug!(key, bytes = payload.len(), "persisted value");
                WriteOutcome::Written
            }
            Err(StorageError::QuotaExceeded { .. }) => self.retry_after_eviction(key, &payload),
            Err(e) => self.drop_write(key, e.to_string()),
        }
    }

    /// Best-effort delete. Returns whether the backend accepted it.
    pub fn remove(&self, key: &str) -> bool {
        match self.storage.remove(key) {
            Ok(()) => true,
            Err(e) => {
                warn!(key, error = %e, "failed to remove stored value");
                false
            }
        }
    }

    //=====================================================================================
    // Crate-internal helpers used by the version gate and hydration
    //=====================================================================================

    /// Reads `key` as untyped JSON. Unreadable content is discarded here.
    pub(crate) fn read_value(&self, key: &str) -> Option<Value> {
        let raw = self.read_raw(key)?;
        match serde_json::from_str::<Value>(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                self.discard(key, format!("stored value is not valid JSON: {e}"));
                None
            }
        }
    }

    pub(crate) fn read_raw(&self, key: &str) -> Option<String> {
        match self.storage.get_raw(key) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key, error = %e, "failed to read stored value");
                None
            }
        }
    }

    pub(crate) fn decode_or<T: DeserializeOwned>(&self, key: &str, value: Value, default: T) -> T {
        match serde_json::from_value(value) {
            Ok(decoded) => decoded,
            Err(e) => {
                self.discard(key, format!("stored value has the wrong shape: {e}"));
                default
            }
        }
    }

    pub(crate) fn discard(&self, key: &str, reason: String) {
        warn!(key, %reason, "discarding stored value, using default");
        self.observer.notify(&PersistenceEvent::ReadDiscarded {
            key: key.to_string(),
            reason,
        });
    }

    pub(crate) fn list_keys(&self) -> Option<Vec<String>> {
        match self.storage.keys() {
            Ok(keys) => Some(keys),
            Err(e) => {
                warn!(error = %e, "failed to list stored keys");
                None
            }
        }
    }

    pub(crate) fn observer(&self) -> &dyn PersistenceObserver {
        self.observer.as_ref()
    }

    fn retry_after_eviction(&self, key: &str, payload: &str) -> WriteOutcome {
        let evict = self.keys.saved_recipes.as_str();
        if self.read_raw(evict).is_some() {
            warn!(key, evict, "storage quota exceeded, evicting saved recipes and retrying");
            if self.remove(evict) {
                self.observer.notify(&PersistenceEvent::Evicted {
                    key: evict.to_string(),
                    for_key: key.to_string(),
                });
            }
        } else {
            warn!(key, "storage quota exceeded with nothing to evict, retrying once");
        }

        match self.storage.set_raw(key, payload) {
            Ok(()) => WriteOutcome::WrittenAfterEviction,
            Err(e) => self.drop_write(key, e.to_string()),
        }
    }

    fn drop_write(&self, key: &str, reason: String) -> WriteOutcome {
        error!(key, %reason, "giving up on write; value is kept in memory only");
        self.observer.notify(&PersistenceEvent::WriteDropped {
            key: key.to_string(),
            reason,
        });
        WriteOutcome::Dropped
    }
}
