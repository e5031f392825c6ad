//! Host file dialogs.
//!
//! The core asks the host to pick files but never shows a dialog itself.
//! `None` means the user cancelled.

use std::path::PathBuf;

/// Native open/save dialogs provided by the host.
pub trait FileDialog {
    /// Pick a canvas file to open.
    fn pick_open(&self) -> Option<PathBuf>;

    /// Pick where to save a file, suggesting `default_name`.
    fn pick_save(&self, default_name: &str) -> Option<PathBuf>;

    /// Pick a directory for exports.
    fn pick_directory(&self) -> Option<PathBuf>;
}

/// Dialog stand-in that answers with fixed paths, for headless hosts and
/// tests.
#[derive(Debug, Clone, Default)]
pub struct PresetDialog {
    pub open: Option<PathBuf>,
    pub directory: Option<PathBuf>,
}

impl PresetDialog {
    /// A dialog that always cancels.
    pub fn cancelled() -> Self {
        Self::default()
    }

    pub fn with_open(mut self, path: impl Into<PathBuf>) -> Self {
        self.open = Some(path.into());
        self
    }

    pub fn with_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.directory = Some(dir.into());
        self
    }
}

impl FileDialog for PresetDialog {
    fn pick_open(&self) -> Option<PathBuf> {
        self.open.clone()
    }

    fn pick_save(&self, default_name: &str) -> Option<PathBuf> {
        self.directory.as_ref().map(|dir| dir.join(default_name))
    }

    fn pick_directory(&self) -> Option<PathBuf> {
        self.directory.clone()
    }
}
