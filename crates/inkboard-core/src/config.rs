//! Persistence settings edited from the settings panel.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default auto-save interval in milliseconds.
pub const DEFAULT_AUTOSAVE_INTERVAL_MS: u64 = 5_000;

/// Bounds for the auto-save interval (surfaced in seconds, 1..=60).
pub const MIN_AUTOSAVE_INTERVAL_MS: u64 = 1_000;
pub const MAX_AUTOSAVE_INTERVAL_MS: u64 = 60_000;

/// Default number of history snapshots kept.
pub const DEFAULT_MAX_HISTORY: usize = 10;

/// Bounds for the history size.
pub const MIN_HISTORY: usize = 1;
pub const MAX_HISTORY: usize = 50;

/// How often and how much the editor persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StorageConfig {
    /// Auto-save interval in milliseconds.
    pub auto_save_interval: u64,
    /// Number of history snapshots kept, newest first.
    pub max_history_count: usize,
    /// Whether each save also overwrites the backup slot.
    pub backup_enabled: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            auto_save_interval: DEFAULT_AUTOSAVE_INTERVAL_MS,
            max_history_count: DEFAULT_MAX_HISTORY,
            backup_enabled: true,
        }
    }
}

impl StorageConfig {
    /// Copy with every field clamped to its allowed range.
    pub fn clamped(self) -> Self {
        Self {
            auto_save_interval: self
                .auto_save_interval
                .clamp(MIN_AUTOSAVE_INTERVAL_MS, MAX_AUTOSAVE_INTERVAL_MS),
            max_history_count: self.max_history_count.clamp(MIN_HISTORY, MAX_HISTORY),
            backup_enabled: self.backup_enabled,
        }
    }

    pub fn auto_save_duration(&self) -> Duration {
        Duration::from_millis(self.auto_save_interval)
    }

    /// Auto-save interval in whole seconds, as shown in the settings panel.
    pub fn auto_save_secs(&self) -> u64 {
        self.auto_save_interval / 1_000
    }

    /// Copy with `patch` applied and the result clamped.
    pub fn merged(self, patch: StorageConfigPatch) -> Self {
        Self {
            auto_save_interval: patch.auto_save_interval.unwrap_or(self.auto_save_interval),
            max_history_count: patch.max_history_count.unwrap_or(self.max_history_count),
            backup_enabled: patch.backup_enabled.unwrap_or(self.backup_enabled),
        }
        .clamped()
    }
}

/// Partial update of a [`StorageConfig`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StorageConfigPatch {
    pub auto_save_interval: Option<u64>,
    pub max_history_count: Option<usize>,
    pub backup_enabled: Option<bool>,
}

impl StorageConfigPatch {
    /// Patch the interval from a value in seconds.
    pub fn auto_save_secs(mut self, secs: u64) -> Self {
        self.auto_save_interval = Some(secs.saturating_mul(1_000));
        self
    }

    pub fn max_history_count(mut self, count: usize) -> Self {
        self.max_history_count = Some(count);
        self
    }

    pub fn backup_enabled(mut self, enabled: bool) -> Self {
        self.backup_enabled = Some(enabled);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
