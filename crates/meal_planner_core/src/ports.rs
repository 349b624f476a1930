//! crates/meal_planner_core/src/ports.rs
//!
//! Defines the contracts (traits) between the store and the outside world.
//! The store is written against these traits so it stays independent of where
//! the bytes actually live and of how a host wants to hear about failures.

//=========================================================================================
// Storage Error and Result Types
//=========================================================================================

/// Errors a durable key/value backend can report.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// The write would take the backend past its capacity.
    #[error("Storage quota exceeded while writing '{key}'")]
    QuotaExceeded { key: String },
    /// The backend could not be reached or refused the operation.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
    #[error("Storage I/O error: {0}")]
    Io(String),
}

/// A convenience type alias for `Result<T, StorageError>`.
pub type StorageResult<T> = Result<T, StorageError>;

//=========================================================================================
// Storage Port
//=========================================================================================

/// A synchronous string key/value store, the shape of a browser's local storage.
pub trait KeyValueStorage: Send + Sync {
    /// Returns the raw stored string, or `None` when the key is absent.
    fn get_raw(&self, key: &str) -> StorageResult<Option<String>>;

    fn set_raw(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Deleting an absent key is not an error.
    fn remove(&self, key: &str) -> StorageResult<()>;

    /// Lists every key currently held.
    fn keys(&self) -> StorageResult<Vec<String>>;
}

//=========================================================================================
// Persistence Observer Port
//=========================================================================================

/// Something the persistence layer recovered from or gave up on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceEvent {
    /// A stored value was unreadable or failed validation and was replaced by
    /// its default.
    ReadDiscarded { key: String, reason: String },
    /// A key was deleted to make room for a write that hit the quota.
    Evicted { key: String, for_key: String },
    /// A write was abandoned. The in-memory copy is now the only copy.
    WriteDropped { key: String, reason: String },
    /// The stored schema version differed and all domain keys were purged.
    VersionPurged {
        previous: Option<String>,
        current: String,
    },
}

/// Receives persistence events so a host can surface them.
pub trait PersistenceObserver: Send + Sync {
    fn notify(&self, event: &PersistenceEvent);
}
