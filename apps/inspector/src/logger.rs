//! Logging for the inspector process.
//!
//! Every record goes to colored stdout and to `<log_dir>/a2a-inspector.log`.
//! The file lines also carry the source location. The level defaults by build
//! profile and can be overridden with `A2A_INSPECTOR_LOG`.

use crate::error::InspectorAppError;

use common::ErrorLocation;

use std::fmt::{Arguments, Display};
use std::fs::File;
use std::io::stdout;
use std::panic::Location;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

use const_format::concatcp;
use fern::colors::Color::{Blue, Green, Magenta, Red, Yellow};
use fern::colors::ColoredLevelConfig;
use fern::{Dispatch, FormatCallback};
use humantime::format_rfc3339_millis;
use inspector_core::INSPECTOR_NAME;
use log::{LevelFilter, Record, info, warn};

pub const LOG_FILE_NAME: &str = concatcp!(INSPECTOR_NAME, ".log");

/// Overrides the level, e.g. `A2A_INSPECTOR_LOG=trace`.
pub const LOG_LEVEL_ENV: &str = "A2A_INSPECTOR_LOG";

#[cfg(debug_assertions)]
const DEFAULT_LEVEL: LevelFilter = LevelFilter::Debug;

#[cfg(not(debug_assertions))]
const DEFAULT_LEVEL: LevelFilter = LevelFilter::Info;

/// Crates that log every WebSocket frame below info.
const FRAME_LEVEL_TARGETS: [&str; 2] = ["tungstenite", "tokio_tungstenite"];

/// Set by the first caller; the global logger can only be installed once.
static INSTALL_CLAIMED: AtomicBool = AtomicBool::new(false);

/// Install the global logger.
///
/// Only the first call does anything. Later calls log a warning and return
/// Ok, even when the first one failed.
///
/// # Errors
///
/// Returns [`InspectorAppError::Inspector`] when the log file cannot be
/// created or another logger is already installed.
pub fn initialize(log_dir: &Path) -> Result<(), InspectorAppError> {
    if INSTALL_CLAIMED.swap(true, Ordering::SeqCst) {
        warn!("Logger already initialized, keeping the first one");
        return Ok(());
    }

    let level = resolve_level(std::env::var(LOG_LEVEL_ENV).ok().as_deref());
    install(log_dir, level)?;

    info!("Logger initialized at {level:?}");
    Ok(())
}

/// Level from the override value, falling back to the build default on
/// a missing or unparsable value.
pub fn resolve_level(value: Option<&str>) -> LevelFilter {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => DEFAULT_LEVEL,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            eprintln!("Ignoring {LOG_LEVEL_ENV}={raw}, using {DEFAULT_LEVEL:?}");
            DEFAULT_LEVEL
        }),
    }
}

#[track_caller]
fn install(log_dir: &Path, level: LevelFilter) -> Result<(), InspectorAppError> {
    let log_file = open_log_file(&log_dir.join(LOG_FILE_NAME))?;

    let colors = ColoredLevelConfig::new()
        .trace(Magenta)
        .debug(Blue)
        .info(Green)
        .warn(Yellow)
        .error(Red);

    let console = Dispatch::new()
        .format(move |out, message, record| {
            write_line(out, message, record, colors.color(record.level()), false)
        })
        .chain(stdout());

    let file = Dispatch::new()
        .format(|out, message, record| write_line(out, message, record, record.level(), true))
        .chain(log_file);

    FRAME_LEVEL_TARGETS
        .iter()
        .fold(Dispatch::new().level(level), |dispatch, target| {
            dispatch.level_for(*target, level.min(LevelFilter::Info))
        })
        .chain(console)
        .chain(file)
        .apply()
        .map_err(|e| InspectorAppError::Inspector {
            message: format!("Another logger is already installed: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })
}

#[track_caller]
fn open_log_file(path: &Path) -> Result<File, InspectorAppError> {
    fern::log_file(path).map_err(|e| InspectorAppError::Inspector {
        message: format!("Failed to open log file {}: {e}", path.display()),
        location: ErrorLocation::from(Location::caller()),
    })
}

fn write_line(
    out: FormatCallback,
    message: &Arguments,
    record: &Record,
    level: impl Display,
    with_source: bool,
) {
    let stamp = format_rfc3339_millis(SystemTime::now());
    let target = record.target();
    if with_source {
        out.finish(format_args!(
            "{stamp} {level:<5} {target}: {message} ({}:{})",
            record.file().unwrap_or("?"),
            record.line().unwrap_or(0)
        ));
    } else {
        out.finish(format_args!("{stamp} {level:<5} {target}: {message}"));
    }
}
