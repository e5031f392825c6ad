//! Inkboard host shell.
//!
//! Wires the core to a file-backed store, a shared sync file and the native
//! file dialogs.

pub mod cli;
pub mod commands;
pub mod dialog;
pub mod error;

pub use cli::{Cli, Command};
pub use commands::run;
pub use dialog::host_dialog;
pub use error::{AppError, AppResult};
