//! JSON file [`KeyValueStore`]
//!
//! The whole store is one JSON object mapping key → value. Values that are
//! JSON objects or arrays are stored as such; everything else is stored as a
//! JSON string, so reads hand back exactly what was written. Every write
//! goes through a temporary file that is synced and then renamed over the
//! store, so a crash never leaves a half-written document behind.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use kickstream_common::auth::{KeyValueStore, StoreError};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use tracing::{debug, warn};

type Document = Map<String, Value>;

/// File-backed store shared by the CLI commands and the callback listener.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl FileStore {
    /// Open the store at `path`, creating its parent directory if needed.
    /// The file itself is created on first write.
    ///
    /// # Errors
    /// Returns [`StoreError::Io`] if the parent directory cannot be created.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| io_error(parent, &err))?;
        }
        debug!(path = %path.display(), "opened file store");
        Ok(Self { path, lock: Mutex::new(()) })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<Document, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Document::new()),
            Err(err) => return Err(io_error(&self.path, &err)),
        };
        if raw.trim().is_empty() {
            return Ok(Document::new());
        }

        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(document)) => Ok(document),
            Ok(_) | Err(_) => {
                warn!(path = %self.path.display(), "store file is not a JSON object; starting empty");
                Ok(Document::new())
            }
        }
    }

    fn write_document(&self, document: &Document) -> Result<(), StoreError> {
        let data = serde_json::to_vec_pretty(document)?;
        let temp_path = self.path.with_extension("tmp");

        let mut file = fs::File::create(&temp_path).map_err(|err| io_error(&temp_path, &err))?;
        file.write_all(&data).map_err(|err| io_error(&temp_path, &err))?;
        file.sync_all().map_err(|err| io_error(&temp_path, &err))?;
        drop(file);

        fs::rename(&temp_path, &self.path).map_err(|err| io_error(&self.path, &err))
    }
}

fn io_error(path: &Path, err: &std::io::Error) -> StoreError {
    StoreError::Io(format!("{}: {err}", path.display()))
}

fn encode(value: &str) -> Value {
    match serde_json::from_str::<Value>(value) {
        Ok(structured @ (Value::Object(_) | Value::Array(_))) => structured,
        _ => Value::String(value.to_string()),
    }
}

fn decode(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let _guard = self.lock.lock();
        Ok(self.read_document()?.get(key).map(decode))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock();
        let mut document = self.read_document()?;
        document.insert(key.to_string(), encode(value));
        self.write_document(&document)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock();
        let mut document = self.read_document()?;
        if document.remove(key).is_none() {
            return Ok(());
        }
        self.write_document(&document)
    }
}
