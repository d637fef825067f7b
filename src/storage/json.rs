//! JSON File Store
//!
//! A whole database in one JSON object: each top-level key is a relation
//! name and its value is the document normalized into that relation's facts.
//!
//! ## Example
//!
//! ```json
//! {
//!   "b": { "id0": [ { "0": 1 }, [11, 12] ] },
//!   "c": ["str10"]
//! }
//! ```
//!
//! Object keys are always strings, so integer-looking keys such as `"0"`
//! reach the synthesizer as strings; rendered into a non-string column they
//! come out bare.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value as JsonValue};
use tracing::debug;

use super::error::{StoreError, StoreResult};
use super::Store;
use crate::value::RawValue;

/// Document store backed by a single JSON file, loaded eagerly
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    documents: Map<String, JsonValue>,
}

impl JsonFileStore {
    /// Load the store at `path`. A missing file is an empty store.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let documents = if path.exists() {
            let text = fs::read_to_string(&path)?;
            if text.trim().is_empty() {
                Map::new()
            } else {
                match serde_json::from_str::<JsonValue>(&text)? {
                    JsonValue::Object(map) => map,
                    other => {
                        return Err(StoreError::Backend(format!(
                            "{} must contain a JSON object, found {}",
                            path.display(),
                            json_kind(&other)
                        )))
                    }
                }
            }
        } else {
            Map::new()
        };

        debug!(path = %path.display(), keys = documents.len(), "json_store_opened");
        Ok(JsonFileStore { path, documents })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Store a value in memory; call [`JsonFileStore::save`] to persist it
    pub fn set(&mut self, key: impl Into<String>, value: &RawValue) {
        self.documents.insert(key.into(), JsonValue::from(value));
    }

    /// Store a raw JSON document as-is
    pub fn set_json(&mut self, key: impl Into<String>, value: JsonValue) {
        self.documents.insert(key.into(), value);
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.documents.remove(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.documents.keys().map(String::as_str)
    }

    /// Write all documents back to the file
    pub fn save(&self) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let text = serde_json::to_string_pretty(&self.documents)?;
        fs::write(&self.path, text)?;
        Ok(())
    }

    /// Drop every document and remove the backing file
    pub fn delete_file(mut self) -> StoreResult<()> {
        self.documents.clear();
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

impl Store for JsonFileStore {
    fn get(&self, key: &str) -> StoreResult<RawValue> {
        let document = self
            .documents
            .get(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        Ok(RawValue::try_from(document.clone())?)
    }

    fn contains(&self, key: &str) -> bool {
        self.documents.contains_key(key)
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}
