//! Command-line arguments.

use clap::{Parser, Subcommand};
use inkboard_core::sync::DEFAULT_SYNC_INTERVAL_MS;
use std::path::PathBuf;

/// Inkboard whiteboard: local store, shared-file sync and file import/export.
#[derive(Debug, Clone, Parser)]
#[command(name = "inkboard")]
#[command(about = "Inkboard whiteboard host shell")]
#[command(version)]
pub struct Cli {
    /// Directory of the local store (defaults to the platform data directory).
    #[arg(long, global = true, env = "INKBOARD_STORE")]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Write an empty canvas to a shared sync file.
    New {
        file: PathBuf,
    },

    /// Add an object (text, image, shape, tool-button) to the stored canvas.
    Add {
        kind: String,
        /// Left edge; defaults to the canvas center.
        #[arg(long)]
        x: Option<f64>,
        /// Top edge; defaults to the canvas center.
        #[arg(long)]
        y: Option<f64>,
        #[arg(long, default_value = "100")]
        width: f64,
        #[arg(long, default_value = "100")]
        height: f64,
    },

    /// Print a summary of the stored canvas.
    Show {
        /// Print the full state as JSON instead.
        #[arg(long)]
        json: bool,
    },

    /// List saved history entries, newest first.
    History,

    /// Replace the stored canvas with the backup.
    RestoreBackup,

    /// Export the stored canvas to a timestamped JSON file.
    Export {
        /// Target directory; a folder dialog is shown when omitted.
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },

    /// Import a canvas file into the store.
    Import {
        /// File to import; an open dialog is shown when omitted.
        file: Option<PathBuf>,
    },

    /// Show or change persistence settings.
    Config {
        /// Auto-save interval in seconds (1-60).
        #[arg(long)]
        auto_save_secs: Option<u64>,
        /// Number of history entries kept (1-50).
        #[arg(long)]
        max_history: Option<usize>,
        /// Whether saves also write the backup slot.
        #[arg(long)]
        backup: Option<bool>,
    },

    /// Keep the stored canvas in sync with a shared file.
    Watch {
        file: PathBuf,
        /// Read-only window: never publish or save, follow the shared file.
        #[arg(long)]
        view: bool,
        /// Settle conflicts automatically: local, remote or merge.
        #[arg(long)]
        strategy: Option<String>,
        #[arg(long, default_value_t = DEFAULT_SYNC_INTERVAL_MS)]
        interval_ms: u64,
        /// Exit after this many polls.
        #[arg(long)]
        max_polls: Option<u64>,
    },
}
