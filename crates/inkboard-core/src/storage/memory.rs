//! In-memory storage and state source implementations.

use super::{BoxFuture, Storage, StorageError, StorageResult};
use crate::canvas::CanvasState;
use crate::sync::{Revision, StateSource};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory storage for testing and ephemeral use.
#[derive(Default)]
pub struct MemoryStorage {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create a new empty memory storage.
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(e: impl std::fmt::Display) -> StorageError {
    StorageError::Other(format!("Lock error: {}", e))
}

impl Storage for MemoryStorage {
    fn set(&self, key: &str, value: &str) -> BoxFuture<'_, StorageResult<()>> {
        let key = key.to_string();
        let value = value.to_string();
        Box::pin(async move {
            let mut values = self.values.write().map_err(lock_error)?;
            values.insert(key, value);
            Ok(())
        })
    }

    fn get(&self, key: &str) -> BoxFuture<'_, StorageResult<String>> {
        let key = key.to_string();
        Box::pin(async move {
            let values = self.values.read().map_err(lock_error)?;
            values.get(&key).cloned().ok_or(StorageError::NotFound(key))
        })
    }

    fn delete(&self, key: &str) -> BoxFuture<'_, StorageResult<()>> {
        let key = key.to_string();
        Box::pin(async move {
            let mut values = self.values.write().map_err(lock_error)?;
            values.remove(&key);
            Ok(())
        })
    }

    fn keys(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        Box::pin(async move {
            let values = self.values.read().map_err(lock_error)?;
            Ok(values.keys().cloned().collect())
        })
    }

    fn exists(&self, key: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let key = key.to_string();
        Box::pin(async move {
            let values = self.values.read().map_err(lock_error)?;
            Ok(values.contains_key(&key))
        })
    }
}

#[derive(Default)]
struct SourceSlot {
    revision: Revision,
    contents: Option<String>,
}

/// In-memory shared state, standing in for a synced file.
///
/// Every write bumps the revision, including raw writes used to simulate a
/// foreign editor producing a broken file.
#[derive(Default)]
pub struct MemorySource {
    slot: RwLock<SourceSlot>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a source that already holds `state`.
    pub fn with_state(state: &CanvasState) -> StorageResult<Self> {
        let source = Self::new();
        source.put_raw(&state.to_json()?)?;
        Ok(source)
    }

    /// Replace the contents with arbitrary text and return the new revision.
    pub fn put_raw(&self, contents: &str) -> StorageResult<Revision> {
        let mut slot = self.slot.write().map_err(lock_error)?;
        slot.revision += 1;
        slot.contents = Some(contents.to_string());
        Ok(slot.revision)
    }
}

impl StateSource for MemorySource {
    fn revision(&self) -> BoxFuture<'_, StorageResult<Option<Revision>>> {
        Box::pin(async move {
            let slot = self.slot.read().map_err(lock_error)?;
            Ok(slot.contents.as_ref().map(|_| slot.revision))
        })
    }

    fn read(&self) -> BoxFuture<'_, StorageResult<CanvasState>> {
        Box::pin(async move {
            let slot = self.slot.read().map_err(lock_error)?;
            let contents = slot
                .contents
                .as_deref()
                .ok_or_else(|| StorageError::NotFound(self.describe()))?;
            Ok(CanvasState::from_json(contents)?)
        })
    }

    fn write(&self, state: &CanvasState) -> BoxFuture<'_, StorageResult<Revision>> {
        let json = state.to_json();
        Box::pin(async move { self.put_raw(&json?) })
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
