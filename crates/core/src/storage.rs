//! Persisted client state.
//!
//! A small string key/value store standing in for browser local storage. It
//! holds exactly two things: the theme preference and the session descriptor.

use crate::constants::THEME_STORAGE_KEY;
use crate::error::{ClientError, ClientResult};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

pub trait PersistedStorage: Send + Sync {
    fn get(&self, key: &str) -> ClientResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> ClientResult<()>;

    fn remove(&self, key: &str) -> ClientResult<()>;
}

/// Storage backed by a single JSON object on disk.
///
/// Every write rewrites the whole file; the store only ever holds a handful of
/// short values.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    guard: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> ClientResult<BTreeMap<String, String>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(contents) => serde_json::from_str(&contents).map_err(ClientError::Deserialization),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(ClientError::StorageRead(e)),
        }
    }

    fn write_all(&self, values: &BTreeMap<String, String>) -> ClientResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(ClientError::StorageWrite)?;
            }
        }
        let json = serde_json::to_string_pretty(values).map_err(ClientError::Serialization)?;
        fs::write(&self.path, json).map_err(ClientError::StorageWrite)
    }
}

impl PersistedStorage for FileStorage {
    fn get(&self, key: &str) -> ClientResult<Option<String>> {
        let _guard = self.guard.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> ClientResult<()> {
        let _guard = self.guard.lock().unwrap_or_else(PoisonError::into_inner);
        let mut values = self.read_all()?;
        values.insert(key.to_string(), value.to_string());
        self.write_all(&values)
    }

    fn remove(&self, key: &str) -> ClientResult<()> {
        let _guard = self.guard.lock().unwrap_or_else(PoisonError::into_inner);
        let mut values = self.read_all()?;
        if values.remove(key).is_some() {
            self.write_all(&values)?;
        }
        Ok(())
    }
}

/// Volatile storage for tests and the offline shell.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PersistedStorage for MemoryStorage {
    fn get(&self, key: &str) -> ClientResult<Option<String>> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> ClientResult<()> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> ClientResult<()> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.remove(key);
        Ok(())
    }
}

/// Colour scheme preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    /// Unknown values fall back to the default theme.
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "light" => Theme::Light,
            _ => Theme::Dark,
        }
    }
}

/// Read the saved theme, defaulting to dark when absent or unreadable.
pub fn load_theme(storage: &dyn PersistedStorage) -> Theme {
    match storage.get(THEME_STORAGE_KEY) {
        Ok(Some(value)) => Theme::parse(&value),
        Ok(None) => Theme::default(),
        Err(e) => {
            tracing::warn!("failed to read theme preference: {}", e);
            Theme::default()
        }
    }
}

pub fn save_theme(storage: &dyn PersistedStorage, theme: Theme) -> ClientResult<()> {
    storage.set(THEME_STORAGE_KEY, theme.as_str())
}
