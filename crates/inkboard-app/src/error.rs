//! Host shell errors.

use inkboard_core::editor::EditError;
use inkboard_core::storage::StorageError;
use inkboard_core::sync::SyncError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Sync(#[from] SyncError),
    #[error(transparent)]
    Edit(#[from] EditError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("No saved canvas")]
    NoState,
    #[error("No backup available")]
    NoBackup,
    #[error("Save failed: {0}")]
    Save(String),
    #[error("Export to {0} failed")]
    Export(String),
}

pub type AppResult<T> = Result<T, AppError>;
