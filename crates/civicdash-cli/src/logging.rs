//! Logging setup for the binary.
//!
//! Three `tracing-subscriber` layers share one registry:
//!  - console on stderr, INFO and up, overridable through `RUST_LOG`
//!  - `<log_dir>/Info/<name>.<date>.log`, INFO and up, one file per command
//!  - `<log_dir>/Warnings/Warnings.<date>.log`, WARN and up, shared by every command
//!
//! Files roll over at midnight UTC and the last 30 days are kept.

use std::fs;
use std::path::{Path, PathBuf};

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::error::CliError;

const INFO_DIR: &str = "Info";
const WARNINGS_DIR: &str = "Warnings";
const WARNINGS_PREFIX: &str = "Warnings";
const LOG_SUFFIX: &str = "log";
const KEPT_LOG_FILES: usize = 30;

/// Directory holding the per-command info logs.
pub fn info_log_dir(log_dir: &Path) -> PathBuf {
    log_dir.join(INFO_DIR)
}

/// Directory holding the shared warnings log.
pub fn warnings_log_dir(log_dir: &Path) -> PathBuf {
    log_dir.join(WARNINGS_DIR)
}

/// Installs the global subscriber. With no `name` only the console layer is used.
pub fn init(log_dir: &Path, name: Option<&str>) -> Result<(), CliError> {
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_filter(console_filter);

    let files = match name {
        Some(name) => Some((
            daily_appender(&info_log_dir(log_dir), name)?,
            daily_appender(&warnings_log_dir(log_dir), WARNINGS_PREFIX)?,
        )),
        None => None,
    };
    let (info_file, warnings_file) = files.unzip();

    let info_layer = info_file.map(|appender| {
        tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_writer(appender)
            .with_filter(LevelFilter::INFO)
    });
    let warnings_layer = warnings_file.map(|appender| {
        tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_writer(appender)
            .with_filter(LevelFilter::WARN)
    });

    tracing_subscriber::registry()
        .with(console_layer)
        .with(info_layer)
        .with(warnings_layer)
        .try_init()
        .map_err(|error| CliError::Logging(error.to_string()))
}

/// `<dir>/<prefix>.<YYYY-MM-DD>.log`, rotated daily, oldest pruned past 30 files.
fn daily_appender(dir: &Path, prefix: &str) -> Result<RollingFileAppender, CliError> {
    fs::create_dir_all(dir)?;
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(prefix)
        .filename_suffix(LOG_SUFFIX)
        .max_log_files(KEPT_LOG_FILES)
        .build(dir)
        .map_err(|error| CliError::Logging(error.to_string()))
}
