//! Auto-save functionality for canvas persistence.
//!
//! Provides periodic saving of the canvas state to prevent data loss. The
//! host drives it from its event loop: mark the state dirty on every commit
//! and call [`AutoSaveManager::maybe_save`] on each tick.

use super::{Persistence, SaveStatus, Storage};
use crate::canvas::CanvasState;
use crate::config::{DEFAULT_AUTOSAVE_INTERVAL_MS, StorageConfig, StorageConfigPatch};
use std::time::{Duration, Instant};

/// Manages automatic canvas persistence.
pub struct AutoSaveManager<S: Storage> {
    persistence: Persistence<S>,
    /// Auto-save interval.
    interval: Duration,
    /// Last save attempt.
    last_save: Option<Instant>,
    /// Whether the state has unsaved changes.
    dirty: bool,
    /// Whether periodic saving is running.
    enabled: bool,
    status: SaveStatus,
}

impl<S: Storage> AutoSaveManager<S> {
    /// Create a stopped auto-save manager.
    pub fn new(persistence: Persistence<S>) -> Self {
        Self {
            persistence,
            interval: Duration::from_millis(DEFAULT_AUTOSAVE_INTERVAL_MS),
            last_save: None,
            dirty: false,
            enabled: false,
            status: SaveStatus::Idle,
        }
    }

    /// Start periodic saving with the interval from the stored settings.
    pub async fn start(&mut self) {
        let config = self.persistence.config().await;
        self.interval = config.auto_save_duration();
        self.enabled = true;
        log::info!("Auto-save every {}s", config.auto_save_secs());
    }

    /// Stop periodic saving. [`should_save`](Self::should_save) is false
    /// from here on.
    pub fn stop(&mut self) {
        self.enabled = false;
    }

    pub fn is_running(&self) -> bool {
        self.enabled
    }

    /// Set the auto-save interval.
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    /// Get the auto-save interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Mark the state as having unsaved changes.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Check if the state has unsaved changes.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Outcome of the most recent save.
    pub fn last_status(&self) -> &SaveStatus {
        &self.status
    }

    /// Check if enough time has passed for an auto-save.
    pub fn should_save(&self) -> bool {
        if !self.enabled || !self.dirty {
            return false;
        }
        match self.last_save {
            Some(last) => last.elapsed() >= self.interval,
            None => true,
        }
    }

    /// Save the state if needed (running, dirty and interval elapsed).
    /// Returns true if a save was attempted.
    pub async fn maybe_save(&mut self, state: &CanvasState) -> bool {
        if !self.should_save() {
            return false;
        }
        self.save(state).await;
        true
    }

    /// Save the state immediately.
    ///
    /// A failed save keeps the state dirty; the next attempt waits a full
    /// interval.
    pub async fn save(&mut self, state: &CanvasState) -> SaveStatus {
        self.status = SaveStatus::Saving;
        let status = self.persistence.save(state).await;
        self.last_save = Some(Instant::now());
        if status == SaveStatus::Saved {
            self.dirty = false;
        } else {
            log::warn!("Auto-save failed, retrying in {}s", self.interval.as_secs());
        }
        self.status = status.clone();
        status
    }

    /// Load the last saved state, if any.
    pub async fn load_last(&mut self) -> Option<CanvasState> {
        let state = self.persistence.load().await?;
        self.dirty = false;
        self.last_save = Some(Instant::now());
        Some(state)
    }

    /// Apply a settings change; a new interval takes effect immediately.
    pub async fn update_config(&mut self, patch: StorageConfigPatch) -> StorageConfig {
        let config = self.persistence.update_config(patch).await;
        self.interval = config.auto_save_duration();
        config
    }

    pub fn persistence(&self) -> &Persistence<S> {
        &self.persistence
    }

    pub fn persistence_mut(&mut self) -> &mut Persistence<S> {
        &mut self.persistence
    }
}
