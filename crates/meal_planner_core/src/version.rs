//! crates/meal_planner_core/src/version.rs
//!
//! The schema version gate. Stored entities are a local cache of regenerable
//! data, so a version change wipes them instead of migrating field by field.

use crate::persistence::PersistenceAdapter;
use crate::ports::PersistenceEvent;
use tracing::info;

/// The entity layout this build reads and writes.
pub const CURRENT_SCHEMA_VERSION: &str = "1.0.0";

/// Reads the stored version tag.
///
/// The tag is written as a JSON string; a bare unquoted tag is accepted too.
pub fn stored_version(adapter: &PersistenceAdapter) -> Option<String> {
    let raw = adapter.read_raw(&adapter.keys().version)?;
    let tag = serde_json::from_str::<String>(&raw).unwrap_or_else(|_| raw.trim().to_string());
    (!tag.is_empty()).then_some(tag)
}

/// Purges every domain key and stamps `expected` when the stored tag is absent
/// or different. Returns whether a purge happened.
pub fn ensure_version(adapter: &PersistenceAdapter, expected: &str) -> bool {
    let previous = stored_version(adapter);
    if previous.as_deref() == Some(expected) {
        return false;
    }

    let keys = adapter.keys();
    let mut doomed: Vec<String> = adapter
        .list_keys()
        .unwrap_or_default()
        .into_iter()
        .filter(|k| keys.is_domain_key(k))
        .collect();
    for key in keys.entity_keys() {
        if !doomed.iter().any(|k| k == key) {
            doomed.push(key.to_string());
        }
    }
    for key in &doomed {
        adapter.remove(key);
    }

    adapter.set(&keys.version, Some(expected));
    info!(
        previous = previous.as_deref().unwrap_or("<none>"),
        current = expected,
        purged = doomed.len(),
        "schema version changed, cleared cached data"
    );
    adapter.observer().notify(&PersistenceEvent::VersionPurged {
        previous,
        current: expected.to_string(),
    });
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStorage;
    use crate::persistence::StorageKeys;
    use crate::ports::KeyValueStorage;
    use std::sync::Arc;

    fn setup() -> (Arc<InMemoryStorage>, PersistenceAdapter) {
        let storage = Arc::new(InMemoryStorage::new());
        let adapter = PersistenceAdapter::new(storage.clone(), StorageKeys::default());
        (storage, adapter)
    }

    #[test]
    fn first_run_stamps_version() {
        let (storage, adapter) = setup();
        assert!(ensure_version(&adapter, "1.0.0"));
        assert_eq!(storage.get_raw("mp_app_version").unwrap().as_deref(), Some("\"1.0.0\""));
        assert_eq!(stored_version(&adapter).as_deref(), Some("1.0.0"));
    }

    #[test]
    fn gate_is_idempotent() {
        let (storage, adapter) = setup();
        assert!(ensure_version(&adapter, "1.0.0"));
        storage.set_raw("mp_meal_plan", "[]").unwrap();
        assert!(!ensure_version(&adapter, "1.0.0"));
        assert_eq!(storage.get_raw("mp_meal_plan").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn mismatch_purges_prefixed_keys_only() {
        let (storage, adapter) = setup();
        storage.set_raw("mp_app_version", "0.9.0").unwrap();
        storage.set_raw("mp_user_profile", "{}").unwrap();
        storage.set_raw("mp_old_cache", "1").unwrap();
        storage.set_raw("theme", "dark").unwrap();

        assert_eq!(stored_version(&adapter).as_deref(), Some("0.9.0"));
        assert!(ensure_version(&adapter, "1.0.0"));

        assert_eq!(storage.get_raw("mp_user_profile").unwrap(), None);
        assert_eq!(storage.get_raw("mp_old_cache").unwrap(), None);
        assert_eq!(storage.get_raw("theme").unwrap().as_deref(), Some("dark"));
        assert_eq!(stored_version(&adapter).as_deref(), Some("1.0.0"));
    }
}
