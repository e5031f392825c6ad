//! Save, history, backup and file export on top of a key-value [`Storage`].
//!
//! Every operation is best-effort: failures are logged and turned into a
//! status or an empty result so the editor keeps running. Only importing a
//! user-picked file reports a parse error to the caller.

use super::{Storage, StorageError, StorageResult};
use crate::canvas::CanvasState;
use crate::config::{StorageConfig, StorageConfigPatch};
use crate::timestamp::{iso_now, to_iso};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Key of the current state.
pub const STATE_KEY: &str = "canvas_state";
/// Key of the history list (newest first).
pub const HISTORY_KEY: &str = "canvas_history";
/// Key of the single backup slot.
pub const BACKUP_KEY: &str = "canvas_backup";
/// Key of the persisted [`StorageConfig`].
pub const CONFIG_KEY: &str = "canvas_config";

/// Contents of the backup slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Backup {
    pub state: CanvasState,
    /// ISO-8601 time the backup was written.
    pub timestamp: String,
}

/// Outcome of the most recent save, shown in the status bar.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SaveStatus {
    #[default]
    Idle,
    Saving,
    Saved,
    Error(String),
}

impl SaveStatus {
    pub fn is_error(&self) -> bool {
        matches!(self, SaveStatus::Error(_))
    }
}

/// File name for an export made at `at`: `canvas_<ISO timestamp>.json`.
///
/// Colons are replaced with `-` so the name is valid on every platform.
pub fn export_file_name(at: DateTime<Utc>) -> String {
    format!("canvas_{}.json", to_iso(at).replace(':', "-"))
}

/// Persistence adapter used by the editor.
pub struct Persistence<S: Storage> {
    storage: Arc<S>,
    /// Loaded on first use.
    config: Option<StorageConfig>,
}

impl<S: Storage> Persistence<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            config: None,
        }
    }

    /// Get a reference to the storage backend.
    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    /// Current settings, read from storage on first access.
    pub async fn config(&mut self) -> StorageConfig {
        if let Some(config) = self.config {
            return config;
        }
        let config = match self.storage.get(CONFIG_KEY).await {
            Ok(json) => match serde_json::from_str::<StorageConfig>(&json) {
                Ok(config) => config.clamped(),
                Err(e) => {
                    log::warn!("Ignoring unreadable settings: {}", e);
                    StorageConfig::default()
                }
            },
            Err(StorageError::NotFound(_)) => StorageConfig::default(),
            Err(e) => {
                log::warn!("Failed to load settings: {}", e);
                StorageConfig::default()
            }
        };
        self.config = Some(config);
        config
    }

    /// Merge `patch` into the settings and persist them.
    pub async fn update_config(&mut self, patch: StorageConfigPatch) -> StorageConfig {
        let config = self.config().await.merged(patch);
        self.config = Some(config);
        match serde_json::to_string(&config) {
            Ok(json) => {
                if let Err(e) = self.storage.set(CONFIG_KEY, &json).await {
                    log::error!("Failed to save settings: {}", e);
                }
            }
            Err(e) => log::error!("Failed to serialize settings: {}", e),
        }
        config
    }

    /// Load the saved state, if any.
    pub async fn load(&self) -> Option<CanvasState> {
        match self.read_json::<CanvasState>(STATE_KEY).await {
            Ok(state) => state,
            Err(e) => {
                log::error!("Failed to load state: {}", e);
                None
            }
        }
    }

    /// Save `state`, push it onto the history and refresh the backup.
    ///
    /// The stored copy gets a fresh whole-state timestamp. Only a failure to
    /// write the state itself is reported; history and backup failures are
    /// logged and skipped for this cycle.
    pub async fn save(&mut self, state: &CanvasState) -> SaveStatus {
        let config = self.config().await;
        let stamped = state.touched();

        if let Err(e) = self.write_json(STATE_KEY, &stamped).await {
            log::error!("Failed to save state: {}", e);
            return SaveStatus::Error(e.to_string());
        }

        if let Err(e) = self.push_history(&stamped, config.max_history_count).await {
            log::error!("Failed to save history: {}", e);
        }

        if config.backup_enabled {
            let backup = Backup {
                state: stamped,
                timestamp: iso_now(),
            };
            if let Err(e) = self.write_json(BACKUP_KEY, &backup).await {
                log::error!("Failed to write backup: {}", e);
            }
        }

        SaveStatus::Saved
    }

    /// Saved history, most recent first.
    pub async fn list_history(&self) -> Vec<CanvasState> {
        match self.read_json::<Vec<CanvasState>>(HISTORY_KEY).await {
            Ok(history) => history.unwrap_or_default(),
            Err(e) => {
                log::error!("Failed to load history: {}", e);
                Vec::new()
            }
        }
    }

    /// The backup slot, if one was written.
    pub async fn backup(&self) -> Option<Backup> {
        match self.read_json::<Backup>(BACKUP_KEY).await {
            Ok(backup) => backup,
            Err(e) => {
                log::error!("Failed to restore backup: {}", e);
                None
            }
        }
    }

    /// State held in the backup slot, if one was written.
    pub async fn restore_backup(&self) -> Option<CanvasState> {
        self.backup().await.map(|b| b.state)
    }

    /// Write `state` as pretty JSON to a timestamp-named file in `dir`.
    pub fn export_to_file(&self, state: &CanvasState, dir: &Path) -> Option<PathBuf> {
        let path = dir.join(export_file_name(Utc::now()));
        let json = match state.to_json_pretty() {
            Ok(json) => json,
            Err(e) => {
                log::error!("Failed to serialize export: {}", e);
                return None;
            }
        };
        match fs::write(&path, json) {
            Ok(()) => {
                log::info!("Exported canvas to {}", path.display());
                Some(path)
            }
            Err(e) => {
                log::error!("Failed to export to {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Parse a user-picked file.
    pub fn import_from_file(&self, bytes: &[u8]) -> StorageResult<CanvasState> {
        CanvasState::from_slice(bytes).map_err(|e| {
            log::error!("Failed to import file: {}", e);
            StorageError::Parse(e.to_string())
        })
    }

    async fn push_history(&self, state: &CanvasState, max: usize) -> StorageResult<()> {
        let mut history = self
            .read_json::<Vec<CanvasState>>(HISTORY_KEY)
            .await
            .unwrap_or_else(|e| {
                log::warn!("Starting a new history: {}", e);
                None
            })
            .unwrap_or_default();

        history.insert(0, state.clone());
        if history.len() > max {
            log::debug!("Evicting {} history entries", history.len() - max);
            history.truncate(max);
        }
        self.write_json(HISTORY_KEY, &history).await
    }

    /// Read and parse a key; a missing key is `Ok(None)`.
    async fn read_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> StorageResult<Option<T>> {
        match self.storage.get(key).await {
            Ok(json) => Ok(Some(serde_json::from_str(&json)?)),
            Err(StorageError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn write_json<T: Serialize>(&self, key: &str, value: &T) -> StorageResult<()> {
        let json = serde_json::to_string(value)?;
        self.storage.set(key, &json).await
    }
}
