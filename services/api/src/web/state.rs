//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::adapters::FileStorage;
use crate::config::Config;
use crate::error::ApiError;
use meal_planner_core::{DomainStore, PersistenceAdapter, RecordingObserver};
use std::sync::Arc;
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::sync::Mutex;
use tracing::info;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
///
/// The store sits behind a mutex, so mutations are applied one at a time in the
/// order requests acquire it.
pub struct AppState {
    pub store: Mutex<DomainStore>,
    pub config: Arc<Config>,
    pub events: Arc<RecordingObserver>,
}

impl AppState {
    /// Opens the storage directory, runs the version gate and hydrates the store.
    pub fn initialize(config: Arc<Config>) -> Result<Self, ApiError> {
        let storage = FileStorage::open(&config.storage_dir, config.storage_quota_bytes)?;
        info!(
            dir = %storage.dir().display(),
            quota = ?config.storage_quota_bytes,
            "file storage ready"
        );

        let events = Arc::new(RecordingObserver::new(config.event_history));
        let adapter = PersistenceAdapter::new(Arc::new(storage), config.storage_keys())
            .with_observer(events.clone());
        let store = DomainStore::open(adapter, &config.schema_version);

        Ok(Self {
            store: Mutex::new(store),
            config,
            events,
        })
    }

    /// Runs one store mutation under the lock.
    ///
    /// Mutations write through to disk, so on a multi-threaded runtime the
    /// worker is marked as blocking for their duration. A current-thread
    /// runtime cannot hand its only worker off and runs them inline.
    pub async fn mutate<R>(&self, mutation: impl FnOnce(&mut DomainStore) -> R) -> R {
        let mut store = self.store.lock().await;
        match Handle::current().runtime_flavor() {
            RuntimeFlavor::MultiThread => tokio::task::block_in_place(|| mutation(&mut store)),
            _ => mutation(&mut store),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meal_planner_core::Recipe;
    use serde_json::json;

    fn breakfast() -> Recipe {
        serde_json::from_value(json!({
            "id": "r1",
            "name": "Oat porridge",
            "mealType": "Breakfast",
            "time": "08:00",
            "ingredients": [{"name": "oats", "amount": "50g"}],
            "steps": ["boil"],
            "nutrition": {"calories": 300.0, "carbs": 40.0, "protein": 12.0, "fat": 8.0, "giLevel": "Low"}
        }))
        .expect("recipe")
    }

    async fn plan_is_written_through(state: &AppState) {
        let stored = state
            .mutate(|store| {
                store.set_meal_plan(vec![breakfast()]);
                store.meal_plan().map(<[Recipe]>::len)
            })
            .await;
        assert_eq!(stored, Some(1));
        assert!(state.config.storage_dir.join("mp_meal_plan.json").exists());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn mutations_run_on_a_multi_threaded_runtime() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = Arc::new(Config::for_tests(dir.path().to_path_buf()));
        let state = AppState::initialize(config).expect("initialize");
        plan_is_written_through(&state).await;
    }

    #[tokio::test]
    async fn mutations_run_on_a_current_thread_runtime() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = Arc::new(Config::for_tests(dir.path().to_path_buf()));
        let state = AppState::initialize(config).expect("initialize");
        plan_is_written_through(&state).await;
    }
}
