//! Storage abstraction for persistence.
//!
//! [`Storage`] is a plain key-value store of JSON strings. [`Persistence`]
//! layers the editor's save/history/backup/export workflow on top of it and
//! [`AutoSaveManager`] decides when to save.

mod autosave;
mod file;
mod memory;
mod persistence;

pub use autosave::AutoSaveManager;
pub use file::{FileSource, FileStorage};
pub use memory::{MemorySource, MemoryStorage};
pub use persistence::{
    BACKUP_KEY, Backup, CONFIG_KEY, HISTORY_KEY, Persistence, STATE_KEY, SaveStatus,
    export_file_name,
};

use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Parse(e.to_string())
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future for storage operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Trait for key-value storage backends.
///
/// Values are JSON strings. Implementations can keep them in memory, in
/// files, or in any other medium; callers never see the medium.
pub trait Storage: Send + Sync {
    /// Store a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// Load a value.
    fn get(&self, key: &str) -> BoxFuture<'_, StorageResult<String>>;

    /// Delete a value. Deleting a missing key is not an error.
    fn delete(&self, key: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// List all keys.
    fn keys(&self) -> BoxFuture<'_, StorageResult<Vec<String>>>;

    /// Check if a key exists.
    fn exists(&self, key: &str) -> BoxFuture<'_, StorageResult<bool>>;
}
