//! Where the inspector keeps its config, log and connection files.
//!
//! # Platform Behavior
//! - **Linux**: `$XDG_CONFIG_HOME/a2a-inspector` or `~/.config/a2a-inspector`
//! - **macOS**: `~/Library/Application Support/a2a-inspector`
//! - **Windows**: `%APPDATA%/a2a-inspector`
//!
//! `A2A_INSPECTOR_CONFIG_DIR` overrides all of these.

use crate::error::InspectorAppError;

use common::ErrorLocation;

use inspector_core::INSPECTOR_NAME;

use std::env;
use std::fs::create_dir_all;
use std::panic::Location;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

pub const CONFIG_DIR_ENV: &str = "A2A_INSPECTOR_CONFIG_DIR";

const LOG_DIR_NAME: &str = "logs";

/// How the config directory was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathSource {
    EnvVar,
    PlatformDefault,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectorPaths {
    pub config_dir: PathBuf,
    pub log_dir: PathBuf,
    pub source: PathSource,
}

impl InspectorPaths {
    fn under(config_dir: PathBuf, source: PathSource) -> Self {
        let log_dir = config_dir.join(LOG_DIR_NAME);
        Self {
            config_dir,
            log_dir,
            source,
        }
    }

    /// Create the config and log directories if they are missing.
    pub fn ensure_exist(&self) -> Result<(), InspectorAppError> {
        for dir in [&self.config_dir, &self.log_dir] {
            create_dir_all(dir).map_err(|e| InspectorAppError::Paths {
                message: format!("Failed to create {}: {e}", dir.display()),
                location: ErrorLocation::from(Location::caller()),
            })?;
        }
        Ok(())
    }
}

/// Load `.env` from the working directory, then from next to the executable.
///
/// Returns the file that was loaded, if any. A missing file is normal.
pub fn load_dotenv() -> Option<PathBuf> {
    if let Ok(path) = dotenvy::dotenv() {
        return Some(path);
    }

    let exe_dir = env::current_exe().ok()?.parent()?.to_path_buf();
    let env_path = exe_dir.join(".env");
    if !env_path.exists() {
        return None;
    }

    match dotenvy::from_path(&env_path) {
        Ok(()) => Some(env_path),
        Err(e) => {
            warn!("Failed to parse .env at {:?}: {}", env_path, e);
            None
        }
    }
}

/// Resolve paths from the environment and the platform.
pub fn detect_inspector_paths() -> Result<InspectorPaths, InspectorAppError> {
    resolve_paths(env::var(CONFIG_DIR_ENV).ok(), dirs::config_dir().as_deref())
}

/// Pick the config directory: an override wins, then the platform default.
pub fn resolve_paths(
    override_dir: Option<String>,
    platform_config_dir: Option<&Path>,
) -> Result<InspectorPaths, InspectorAppError> {
    if let Some(custom_dir) = override_dir.filter(|d| !d.trim().is_empty()) {
        info!("Using {CONFIG_DIR_ENV} override: {custom_dir}");
        return Ok(InspectorPaths::under(
            PathBuf::from(custom_dir),
            PathSource::EnvVar,
        ));
    }

    if let Some(config_dir) = platform_config_dir {
        let inspector_dir = config_dir.join(INSPECTOR_NAME);
        debug!("Platform config dir: {:?}", inspector_dir);
        return Ok(InspectorPaths::under(
            inspector_dir,
            PathSource::PlatformDefault,
        ));
    }

    Err(InspectorAppError::Paths {
        message: format!("No platform config directory; set {CONFIG_DIR_ENV}"),
        location: ErrorLocation::from(Location::caller()),
    })
}
