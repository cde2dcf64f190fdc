//! Synchronous string-keyed storage scoped to one client, the role
//! `localStorage` plays in a browser. Either process memory or a small JSON
//! file that survives restarts.

use crate::errors::CacheError;
use serde_json::{Map, Value};
use std::{
    collections::HashMap,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::RwLock,
};
use tracing::{debug, warn};

pub trait LocalCache: Send + Sync {
    /// Returns the raw value stored under `key`.
    ///
    /// # Errors
    /// Returns an error if the backing storage cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// # Errors
    /// Returns an error if the backing storage cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), CacheError>;

    /// # Errors
    /// Returns an error if the backing storage cannot be written.
    fn remove(&self, key: &str) -> Result<(), CacheError>;
}

#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalCache for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let entries = self.entries.read().map_err(|_| CacheError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let mut entries = self.entries.write().map_err(|_| CacheError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        let mut entries = self.entries.write().map_err(|_| CacheError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }
}

/// JSON object on disk, rewritten atomically (temp file + rename) on every write.
#[derive(Debug)]
pub struct FileCache {
    path: PathBuf,
    lock: RwLock<()>,
}

impl FileCache {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: RwLock::new(()),
        }
    }

    /// Default location under the user cache directory.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::cache_dir().map(|dir| dir.join(env!("CARGO_PKG_NAME")).join("storage.json"))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<Map<String, Value>, CacheError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(err) => return Err(err.into()),
        };

        if raw.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&raw)? {
            Value::Object(entries) => Ok(entries),
            other => Err(CacheError::Corrupt(format!(
                "expected a JSON object, found {}",
                type_name(&other)
            ))),
        }
    }

    /// Reads entries for a write; a corrupt file is replaced rather than kept.
    fn read_entries_for_write(&self) -> Result<Map<String, Value>, CacheError> {
        match self.read_entries() {
            Err(CacheError::Corrupt(reason)) => {
                warn!(path = %self.path.display(), "discarding corrupt cache file: {reason}");
                Ok(Map::new())
            }
            other => other,
        }
    }

    fn write_entries(&self, entries: &Map<String, Value>) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let payload = serde_json::to_vec_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, payload)?;
        fs::rename(&tmp, &self.path)?;

        debug!(path = %self.path.display(), entries = entries.len(), "cache written");
        Ok(())
    }
}

impl LocalCache for FileCache {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let _guard = self.lock.read().map_err(|_| CacheError::Poisoned)?;
        let entries = self.read_entries()?;

        match entries.get(key) {
            None => Ok(None),
            Some(Value::String(value)) => Ok(Some(value.clone())),
            Some(other) => Err(CacheError::Corrupt(format!(
                "entry {key} is a {}, not a string",
                type_name(other)
            ))),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let _guard = self.lock.write().map_err(|_| CacheError::Poisoned)?;
        let mut entries = self.read_entries_for_write()?;
        entries.insert(key.to_string(), Value::String(value.to_string()));
        self.write_entries(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        let _guard = self.lock.write().map_err(|_| CacheError::Poisoned)?;
        let mut entries = self.read_entries_for_write()?;
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.write_entries(&entries)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
