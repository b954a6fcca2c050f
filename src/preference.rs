//! Persisted language preference.
//!
//! The browser keeps the choice under the `ui.lang` storage key. Here the
//! storage is a trait so the engine can run against a JSON file or memory.

use crate::error::PreferenceError;
use crate::i18n::Language;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::warn;

/// Storage key holding the language code.
pub const PREFERENCE_KEY: &str = "ui.lang";

pub trait PreferenceStore: Send + Sync {
    /// Stored code, if any. Storage failures read as "unset".
    fn load(&self) -> Option<String>;

    fn save(&self, code: &str) -> Result<(), PreferenceError>;
}

/// Read the stored language, resetting unset or unsupported values to the
/// canonical language and persisting the reset.
pub fn resolve_language(store: &dyn PreferenceStore) -> Language {
    let stored = store.load();
    if let Some(language) = stored.as_deref().and_then(|code| Language::from_code(code).ok()) {
        return language;
    }

    let fallback = Language::canonical();
    if let Some(code) = stored {
        warn!(
            "Stored language {:?} is not supported, resetting to {}",
            code, fallback
        );
    }
    if let Err(e) = store.save(fallback.code()) {
        warn!("Failed to persist default language: {}", e);
    }
    fallback
}

/// In-process store, used by tests and embedders without persistence.
#[derive(Debug, Default)]
pub struct MemoryStore {
    value: RwLock<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(code: &str) -> Self {
        Self {
            value: RwLock::new(Some(code.to_string())),
        }
    }
}

impl PreferenceStore for MemoryStore {
    fn load(&self) -> Option<String> {
        self.value
            .read()
            .map(|v| v.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    fn save(&self, code: &str) -> Result<(), PreferenceError> {
        let mut guard = self
            .value
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Some(code.to_string());
        Ok(())
    }
}

/// JSON file store: `{"ui.lang": "ar"}`. Other keys in the file are kept.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<Map<String, Value>, PreferenceError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(source) => {
                return Err(PreferenceError::Io {
                    path: self.path.display().to_string(),
                    source,
                })
            }
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Ok(Map::new()),
            Err(source) => Err(PreferenceError::Corrupt {
                path: self.path.display().to_string(),
                source,
            }),
        }
    }
}

impl PreferenceStore for FileStore {
    fn load(&self) -> Option<String> {
        match self.read_map() {
            Ok(map) => map
                .get(PREFERENCE_KEY)
                .and_then(Value::as_str)
                .map(str::to_string),
            Err(e) => {
                warn!("{}", e);
                None
            }
        }
    }

    fn save(&self, code: &str) -> Result<(), PreferenceError> {
        // A corrupt file is overwritten rather than blocking the switch.
        let mut map = self.read_map().unwrap_or_default();
        map.insert(PREFERENCE_KEY.to_string(), Value::String(code.to_string()));

        let body = Value::Object(map).to_string();
        std::fs::write(&self.path, body).map_err(|source| PreferenceError::Io {
            path: self.path.display().to_string(),
            source,
        })
    }
}
