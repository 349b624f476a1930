//! crates/meal_planner_core/src/memory.rs
//!
//! An in-process `KeyValueStorage` backed by a map, with an optional byte quota
//! that mimics a browser's storage limit.

use crate::ports::{KeyValueStorage, StorageError, StorageResult};
use std::collections::BTreeMap;
use std::sync::RwLock;

/// Map-backed storage. Usage is counted as key bytes plus value bytes.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    entries: RwLock<BTreeMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage that rejects writes taking total usage past `quota_bytes`.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            entries: RwLock::default(),
            quota_bytes: Some(quota_bytes),
        }
    }

    /// Bytes currently used.
    pub fn usage(&self) -> usize {
        self.entries
            .read()
            .map(|entries| entries.iter().map(|(k, v)| k.len() + v.len()).sum())
            .unwrap_or(0)
    }

    fn poisoned() -> StorageError {
        StorageError::Unavailable("in-memory storage lock poisoned".to_string())
    }
}

impl KeyValueStorage for InMemoryStorage {
    fn get_raw(&self, key: &str) -> StorageResult<Option<String>> {
        let entries = self.entries.read().map_err(|_| Self::poisoned())?;
        Ok(entries.get(key).cloned())
    }

    fn set_raw(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut entries = self.entries.write().map_err(|_| Self::poisoned())?;
        if let Some(quota) = self.quota_bytes {
            let others: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            if others + key.len() + value.len() > quota {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                });
            }
        }
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let mut entries = self.entries.write().map_err(|_| Self::poisoned())?;
        entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        let entries = self.entries.read().map_err(|_| Self::poisoned())?;
        Ok(entries.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_remove() {
        let storage = InMemoryStorage::new();
        storage.set_raw("a", "1").unwrap();
        assert_eq!(storage.get_raw("a").unwrap().as_deref(), Some("1"));
        storage.remove("a").unwrap();
        assert_eq!(storage.get_raw("a").unwrap(), None);
        storage.remove("a").unwrap();
    }

    #[test]
    fn quota_counts_replacement_not_addition() {
        let storage = InMemoryStorage::with_quota(10);
        storage.set_raw("k", "123456789").unwrap();
        // Replacing the same key frees the old value first.
        storage.set_raw("k", "abcdefghi").unwrap();
        let err = storage.set_raw("j", "x").unwrap_err();
        assert_eq!(err, StorageError::QuotaExceeded { key: "j".to_string() });
        assert_eq!(storage.usage(), 10);
    }
}
