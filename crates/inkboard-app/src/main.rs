//! Main application entry point.

use clap::Parser;
use inkboard_app::Cli;
use std::process::ExitCode;

/// Log level used when `RUST_LOG` is not set.
const DEFAULT_LOG_FILTER: &str = "inkboard=info,inkboard_app=info,inkboard_core=info";

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(DEFAULT_LOG_FILTER))
        .init();

    let cli = Cli::parse();
    log::debug!("Starting Inkboard: {:?}", cli.command);

    let dialog = inkboard_app::host_dialog();
    match inkboard_app::run(cli, dialog.as_ref()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
