//! Native file dialogs.

use inkboard_core::dialog::FileDialog;
#[cfg(not(feature = "native"))]
use inkboard_core::dialog::PresetDialog;
#[cfg(feature = "native")]
use std::path::PathBuf;

/// File dialogs backed by `rfd`.
#[cfg(feature = "native")]
#[derive(Debug, Default, Clone, Copy)]
pub struct RfdDialog;

#[cfg(feature = "native")]
impl FileDialog for RfdDialog {
    fn pick_open(&self) -> Option<PathBuf> {
        rfd::FileDialog::new()
            .set_title("Open Canvas")
            .add_filter("Inkboard Canvas", &["json"])
            .pick_file()
    }

    fn pick_save(&self, default_name: &str) -> Option<PathBuf> {
        rfd::FileDialog::new()
            .set_title("Save Canvas")
            .set_file_name(default_name)
            .add_filter("Inkboard Canvas", &["json"])
            .save_file()
    }

    fn pick_directory(&self) -> Option<PathBuf> {
        rfd::FileDialog::new().set_title("Export Canvas").pick_folder()
    }
}

/// The dialog implementation for this build.
#[cfg(feature = "native")]
pub fn host_dialog() -> Box<dyn FileDialog> {
    Box::new(RfdDialog)
}

/// Headless builds have no dialogs: every pick is cancelled.
#[cfg(not(feature = "native"))]
pub fn host_dialog() -> Box<dyn FileDialog> {
    Box::new(PresetDialog::cancelled())
}
