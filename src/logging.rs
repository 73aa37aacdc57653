// src/logging.rs

use color_eyre::eyre::Result;
use directories::ProjectDirs;
use lazy_static::lazy_static;
use std::path::{Path, PathBuf};
use time::macros::format_description;
use tracing_error::ErrorLayer;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

lazy_static! {
    /// `SHADOWRECON_LOGLEVEL`, consulted when `RUST_LOG` is unset.
    static ref LEVEL_VAR: String = format!("{}_LOGLEVEL", env!("CARGO_CRATE_NAME").to_uppercase());
    static ref DEFAULT_DIRECTIVE: String = format!("{}=info", env!("CARGO_CRATE_NAME"));
}

/// Where the log file lives: the platform's local data dir, or `./.data`.
fn log_directory() -> PathBuf {
    ProjectDirs::from("com", "shadowrecon", env!("CARGO_PKG_NAME"))
        .map(|dirs| dirs.data_local_dir().to_path_buf())
        .unwrap_or_else(|| Path::new(".").join(".data"))
}

/// Picks the first filter directive that is set.
fn pick_directive(rust_log: Option<String>, level_var: Option<String>) -> String {
    rust_log
        .or(level_var)
        .filter(|directive| !directive.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_DIRECTIVE.clone())
}

/// Installs the file logger and returns the path it writes to.
///
/// The terminal belongs to the TUI, so nothing goes to stdout or stderr.
pub fn initialize_logging() -> Result<PathBuf> {
    let directory = log_directory();
    std::fs::create_dir_all(&directory)?;
    let log_path = directory.join(concat!(env!("CARGO_PKG_NAME"), ".log"));
    let writer = std::fs::File::create(&log_path)?;

    let directive = pick_directive(std::env::var("RUST_LOG").ok(), std::env::var(LEVEL_VAR.as_str()).ok());

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_timer(LocalTime::new(format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]"
        )))
        .with_filter(EnvFilter::new(directive));

    tracing_subscriber::registry().with(file_layer).with(ErrorLayer::default()).init();

    Ok(log_path)
}
