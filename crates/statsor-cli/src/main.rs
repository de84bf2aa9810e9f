//! Statsor CLI - manage a football club's players, teams and matches from
//! the terminal.
//!
//! Data lives in the club's Supabase project; `--offline` runs every command
//! against a throwaway in-memory store instead.

mod app;
mod cli;
mod output;

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use statsor_core::{Config, DataError};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::App;
use cli::Cli;

/// Log file name inside `<cache_dir>/logs`
const LOG_FILE: &str = "statsor.log";

/// Initialize the tracing subscriber: stderr plus a daily log file.
///
/// The returned guard flushes the file writer and must live until exit.
fn init_tracing(log_dir: Option<PathBuf>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let config_result = Config::load();
    let log_dir = config_result
        .as_ref()
        .ok()
        .and_then(|c| c.cache_dir().ok())
        .map(|dir| dir.join("logs"));
    let _guard = init_tracing(log_dir);
    info!("Statsor starting");

    let config = match config_result {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "Failed to load config, using defaults");
            let mut config = Config::default();
            config.apply_overrides(|name| std::env::var(name).ok());
            config
        }
    };

    let mut app = App::new(config, cli.offline).await?;
    let result = app.run(cli.command).await;
    if let Err(e) = &result {
        if e.downcast_ref::<DataError>().is_some_and(DataError::needs_sign_in) {
            eprintln!("Run `statsor login` to sign in.");
        }
    }
    result
}
