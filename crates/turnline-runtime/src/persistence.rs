#![forbid(unsafe_code)]

//! Settings persistence.
//!
//! The timeline stores two kinds of small JSON values: the panel position
//! ([`PositionSnapshot`](turnline_layout::drag::PositionSnapshot)) and the
//! starred marker ids of each conversation. Where they live is the host's
//! business, behind the [`SettingsStore`] trait.
//!
//! # Failure policy
//!
//! Storage is a convenience, never a requirement. [`PersistenceGate`] wraps a
//! store and turns the first read or write failure into a logged warning
//! plus a session-wide switch to in-memory state: after that no further
//! reads or writes reach the store.
//!
//! # File Format
//!
//! [`JsonFileStore`] keeps every key in one JSON object:
//!
//! ```json
//! {
//!   "turnline.position": { "version": 1, "leftPercent": 91.5, ... },
//!   "turnline.starred.chat-42": ["turn-3", "turn-17"]
//! }
//! ```
//!
//! Writes use a temp-file-then-rename pattern to prevent corruption on crash.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Key of the stored panel position.
pub const POSITION_KEY: &str = "turnline.position";

/// Prefix of per-scope starred id keys.
pub const STARRED_KEY_PREFIX: &str = "turnline.starred.";

/// Key holding the starred ids of `scope`.
#[must_use]
pub fn starred_key(scope: &str) -> String {
    format!("{STARRED_KEY_PREFIX}{scope}")
}

/// Errors from a [`SettingsStore`] backend.
#[derive(Debug)]
pub enum PersistenceError {
    /// I/O error reading or writing the backing file.
    Io(io::Error),
    /// The stored data is not valid JSON.
    Json(serde_json::Error),
    /// The stored data is JSON but not the expected shape.
    Format(String),
}

impl std::fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Json(e) => write!(f, "JSON error: {e}"),
            Self::Format(msg) => write!(f, "unexpected settings format: {msg}"),
        }
    }
}

impl std::error::Error for PersistenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::Format(_) => None,
        }
    }
}

impl From<io::Error> for PersistenceError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

/// Key-value storage for JSON settings.
pub trait SettingsStore {
    /// Read `key`; `Ok(None)` when it was never written.
    fn load(&mut self, key: &str) -> Result<Option<Value>, PersistenceError>;

    /// Write `value` under `key`.
    fn save(&mut self, key: &str, value: Value) -> Result<(), PersistenceError>;

    /// Delete `key`. Deleting a missing key is not an error.
    fn remove(&mut self, key: &str) -> Result<(), PersistenceError>;
}

impl<S: SettingsStore + ?Sized> SettingsStore for Box<S> {
    fn load(&mut self, key: &str) -> Result<Option<Value>, PersistenceError> {
        (**self).load(key)
    }

    fn save(&mut self, key: &str, value: Value) -> Result<(), PersistenceError> {
        (**self).save(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistenceError> {
        (**self).remove(key)
    }
}

/// In-memory store. Never fails.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, Value>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SettingsStore for MemoryStore {
    fn load(&mut self, key: &str) -> Result<Option<Value>, PersistenceError> {
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: Value) -> Result<(), PersistenceError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistenceError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// All keys in one JSON object file.
///
/// The file is read lazily on first access and cached; a missing file is an
/// empty store. The parent directory must already exist.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    cache: Option<Map<String, Value>>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: None,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn entries(&mut self) -> Result<&mut Map<String, Value>, PersistenceError> {
        if self.cache.is_none() {
            self.cache = Some(read_object(&self.path)?);
        }
        Ok(self.cache.get_or_insert_with(Map::new))
    }

    fn flush(&self, entries: &Map<String, Value>) -> Result<(), PersistenceError> {
        let json = serde_json::to_string_pretty(entries)?;
        // Atomic write: temp file then rename
        let temp = self.path.with_extension("json.tmp");
        std::fs::write(&temp, json)?;
        std::fs::rename(&temp, &self.path)?;
        Ok(())
    }
}

fn read_object(path: &Path) -> Result<Map<String, Value>, PersistenceError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Map::new()),
        Err(e) => return Err(e.into()),
    };
    match serde_json::from_str(&contents)? {
        Value::Object(map) => Ok(map),
        other => Err(PersistenceError::Format(format!(
            "expected a JSON object at the top level, found {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl SettingsStore for JsonFileStore {
    fn load(&mut self, key: &str) -> Result<Option<Value>, PersistenceError> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: Value) -> Result<(), PersistenceError> {
        let mut entries = self.entries()?.clone();
        entries.insert(key.to_string(), value);
        self.flush(&entries)?;
        self.cache = Some(entries);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistenceError> {
        if !self.entries()?.contains_key(key) {
            return Ok(());
        }
        let mut entries = self.entries()?.clone();
        entries.remove(key);
        self.flush(&entries)?;
        self.cache = Some(entries);
        Ok(())
    }
}

/// A store that switches itself off after the first failure.
#[derive(Debug)]
pub struct PersistenceGate<S> {
    store: S,
    failure: Option<String>,
}

impl<S: SettingsStore> PersistenceGate<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            failure: None,
        }
    }

    /// `false` once a failure has disabled the store for this session.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.failure.is_none()
    }

    /// Description of the failure that disabled the store.
    #[must_use]
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Read and decode `key`.
    ///
    /// A value that does not decode as `T` is skipped with a warning but does
    /// not disable the store; the next save overwrites it.
    pub fn load<T: DeserializeOwned>(&mut self, key: &str) -> Option<T> {
        if !self.is_enabled() {
            return None;
        }
        let value = match self.store.load(key) {
            Ok(value) => value?,
            Err(e) => {
                self.disable("load", key, &e);
                return None;
            }
        };
        match serde_json::from_value(value) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                tracing::warn!(
                    target: "turnline.persist",
                    key,
                    error = %e,
                    "stored value ignored"
                );
                None
            }
        }
    }

    /// Encode and write `value` under `key`. Returns `true` when written.
    pub fn save<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> bool {
        if !self.is_enabled() {
            return false;
        }
        let result = serde_json::to_value(value)
            .map_err(PersistenceError::from)
            .and_then(|value| self.store.save(key, value));
        match result {
            Ok(()) => {
                tracing::trace!(target: "turnline.persist", key, "setting saved");
                true
            }
            Err(e) => {
                self.disable("save", key, &e);
                false
            }
        }
    }

    /// Delete `key`. Returns `true` when the store accepted the removal.
    pub fn remove(&mut self, key: &str) -> bool {
        if !self.is_enabled() {
            return false;
        }
        match self.store.remove(key) {
            Ok(()) => true,
            Err(e) => {
                self.disable("remove", key, &e);
                false
            }
        }
    }

    fn disable(&mut self, operation: &'static str, key: &str, error: &PersistenceError) {
        tracing::warn!(
            target: "turnline.persist",
            operation,
            key,
            error = %error,
            "settings store failed; keeping state in memory for this session"
        );
        self.failure = Some(format!("{operation} {key}: {error}"));
    }
}
