//! services/api/src/adapters/file_storage.rs
//!
//! This module contains the file-backed storage adapter, the concrete
//! implementation of the `KeyValueStorage` port used by the service. Each key is
//! one `<key>.json` file in a directory, and the directory as a whole is held to
//! a byte quota the way a browser holds an origin's local storage.

use meal_planner_core::{KeyValueStorage, StorageError, StorageResult};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use uuid::Uuid;

const EXTENSION: &str = "json";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A directory of JSON files implementing the `KeyValueStorage` port.
#[derive(Debug)]
pub struct FileStorage {
    dir: PathBuf,
    quota_bytes: Option<u64>,
    /// Serializes writers so the quota check and the write see the same usage.
    write_lock: Mutex<()>,
}

impl FileStorage {
    /// Opens (creating if needed) the storage directory.
    pub fn open(dir: impl Into<PathBuf>, quota_bytes: Option<u64>) -> StorageResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| {
            StorageError::Unavailable(format!("cannot create {}: {}", dir.display(), e))
        })?;
        Ok(Self {
            dir,
            quota_bytes,
            write_lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Bytes used by stored entries, optionally ignoring one key. An entry
    /// counts its key bytes plus its value bytes, matching `InMemoryStorage`.
    pub fn usage_bytes(&self, excluding: Option<&str>) -> StorageResult<u64> {
        let mut total = 0;
        for (key, path) in self.entries()? {
            if excluding == Some(key.as_str()) {
                continue;
            }
            let value_len = fs::metadata(&path).map(|m| m.len()).map_err(io_error)?;
            total += key.len() as u64 + value_len;
        }
        Ok(total)
    }

    fn path_for(&self, key: &str) -> StorageResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.');
        if !valid || key.starts_with('.') {
            return Err(StorageError::Unavailable(format!(
                "unsupported storage key '{key}'"
            )));
        }
        Ok(self.dir.join(format!("{key}.{EXTENSION}")))
    }

    fn entries(&self) -> StorageResult<Vec<(String, PathBuf)>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(io_error)? {
            let path = entry.map_err(io_error)?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                entries.push((stem.to_string(), path.clone()));
            }
        }
        Ok(entries)
    }
}

fn io_error(e: std::io::Error) -> StorageError {
    StorageError::Io(e.to_string())
}

//=========================================================================================
// `KeyValueStorage` Trait Implementation
//=========================================================================================

impl KeyValueStorage for FileStorage {
    fn get_raw(&self, key: &str) -> StorageResult<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(e)),
        }
    }

    fn set_raw(&self, key: &str, value: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| StorageError::Unavailable("file storage lock poisoned".to_string()))?;

        // 1. Enforce the quota against everything except the value being replaced.
        if let Some(quota) = self.quota_bytes {
            let others = self.usage_bytes(Some(key))?;
            if others + (key.len() + value.len()) as u64 > quota {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                });
            }
        }

        // 2. Write to a temp file and rename so readers never see a partial value.
        let temp_path = self.dir.join(format!("{key}.{}.tmp", Uuid::new_v4().simple()));
        fs::write(&temp_path, value).map_err(io_error)?;
        fs::rename(&temp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            io_error(e)
        })
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(e)),
        }
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        let mut keys: Vec<String> = self.entries()?.into_iter().map(|(key, _)| key).collect();
        keys.sort();
        Ok(keys)
    }
}
