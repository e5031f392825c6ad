//! File-based storage and state source implementations.

use super::{BoxFuture, Storage, StorageError, StorageResult};
use crate::canvas::CanvasState;
use crate::sync::{Revision, StateSource};
use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

/// File-based key-value storage.
///
/// Stores each value as a JSON file in a specified directory.
pub struct FileStorage {
    /// Base directory for stored values.
    base_path: PathBuf,
}

impl FileStorage {
    /// Create a new file storage with the given base directory.
    ///
    /// Creates the directory if it doesn't exist.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                StorageError::Io(format!("Failed to create storage directory: {}", e))
            })?;
        }
        Ok(Self { base_path })
    }

    /// Create file storage in the default location.
    ///
    /// On Unix: `~/.local/share/inkboard/store/`
    /// On Windows: `%LOCALAPPDATA%\inkboard\store\`
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Io("Could not determine home directory".to_string()))?;

        Self::new(base.join("inkboard").join("store"))
    }

    /// Get the file path for a key.
    fn value_path(&self, key: &str) -> PathBuf {
        // Sanitize key to be safe for filenames
        let safe_key: String = key
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_path.join(format!("{}.json", safe_key))
    }

    /// Get the base path.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

impl Storage for FileStorage {
    fn set(&self, key: &str, value: &str) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.value_path(key);
        let value = value.to_string();
        Box::pin(async move {
            fs::write(&path, value).map_err(|e| {
                StorageError::Io(format!("Failed to write {}: {}", path.display(), e))
            })
        })
    }

    fn get(&self, key: &str) -> BoxFuture<'_, StorageResult<String>> {
        let path = self.value_path(key);
        let key = key.to_string();
        Box::pin(async move {
            if !path.exists() {
                return Err(StorageError::NotFound(key));
            }
            fs::read_to_string(&path).map_err(|e| {
                StorageError::Io(format!("Failed to read {}: {}", path.display(), e))
            })
        })
    }

    fn delete(&self, key: &str) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.value_path(key);
        Box::pin(async move {
            if path.exists() {
                fs::remove_file(&path).map_err(|e| {
                    StorageError::Io(format!("Failed to delete {}: {}", path.display(), e))
                })?;
            }
            Ok(())
        })
    }

    fn keys(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        let base = self.base_path.clone();
        Box::pin(async move {
            if !base.exists() {
                return Ok(vec![]);
            }

            let entries = fs::read_dir(&base)
                .map_err(|e| StorageError::Io(format!("Failed to read directory: {}", e)))?;

            let keys = entries
                .flatten()
                .map(|entry| entry.path())
                .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
                .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(String::from))
                .collect();
            Ok(keys)
        })
    }

    fn exists(&self, key: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let path = self.value_path(key);
        Box::pin(async move { Ok(path.exists()) })
    }
}

/// A canvas state file shared between editor windows.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_bytes(&self) -> StorageResult<Vec<u8>> {
        fs::read(&self.path).map_err(|e| {
            StorageError::Io(format!("Failed to read {}: {}", self.path.display(), e))
        })
    }
}

/// Change token for file contents. Equal contents with an equal mtime give
/// the same revision; any rewrite with new contents gives a different one.
fn content_revision(bytes: &[u8], modified: Option<std::time::SystemTime>) -> Revision {
    let mut hasher = DefaultHasher::new();
    modified.hash(&mut hasher);
    bytes.hash(&mut hasher);
    hasher.finish()
}

impl StateSource for FileSource {
    fn revision(&self) -> BoxFuture<'_, StorageResult<Option<Revision>>> {
        Box::pin(async move {
            if !self.path.exists() {
                return Ok(None);
            }
            let modified = fs::metadata(&self.path).and_then(|m| m.modified()).ok();
            let bytes = self.read_bytes()?;
            Ok(Some(content_revision(&bytes, modified)))
        })
    }

    fn read(&self) -> BoxFuture<'_, StorageResult<CanvasState>> {
        Box::pin(async move {
            if !self.path.exists() {
                return Err(StorageError::NotFound(self.describe()));
            }
            let bytes = self.read_bytes()?;
            CanvasState::from_slice(&bytes).map_err(|e| {
                StorageError::Parse(format!("Failed to parse {}: {}", self.path.display(), e))
            })
        })
    }

    fn write(&self, state: &CanvasState) -> BoxFuture<'_, StorageResult<Revision>> {
        let json = state.to_json_pretty();
        Box::pin(async move {
            let json = json?;
            if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|e| {
                    StorageError::Io(format!("Failed to create {}: {}", parent.display(), e))
                })?;
            }
            fs::write(&self.path, &json).map_err(|e| {
                StorageError::Io(format!("Failed to write {}: {}", self.path.display(), e))
            })?;
            let modified = fs::metadata(&self.path).and_then(|m| m.modified()).ok();
            Ok(content_revision(json.as_bytes(), modified))
        })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
