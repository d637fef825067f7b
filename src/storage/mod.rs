//! Storage Module
//!
//! The key-value/document store that EDB facts are pulled from. The engine
//! only ever asks for the value stored under a relation name; everything
//! else about the backend is up to the implementation.
//!
//! - [`MemoryStore`]: in-process map, used by tests and embedders
//! - [`JsonFileStore`]: a single JSON object file, one document per key
//!
//! A missing key is reported as [`StoreError::NotFound`] and means "no facts
//! for this relation". Any other error is a real failure and aborts the run.

pub mod error;
pub mod json;

use indexmap::IndexMap;

use crate::value::RawValue;

// Re-export commonly used types
pub use error::{StoreError, StoreResult};
pub use json::JsonFileStore;

/// Read access to stored documents, keyed by relation name
pub trait Store {
    /// Fetch the raw value stored under `key`
    fn get(&self, key: &str) -> StoreResult<RawValue>;

    /// Check if a value is stored under `key`
    fn contains(&self, key: &str) -> bool {
        self.get(key).is_ok()
    }
}

impl<S: Store + ?Sized> Store for &S {
    fn get(&self, key: &str) -> StoreResult<RawValue> {
        (**self).get(key)
    }

    fn contains(&self, key: &str) -> bool {
        (**self).contains(key)
    }
}

/// In-memory store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: IndexMap<String, RawValue>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Store a value, replacing any previous one
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<RawValue>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<RawValue> {
        self.values.shift_remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> StoreResult<RawValue> {
        self.values
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }
}
