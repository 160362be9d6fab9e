use crate::error::config::ConfigError;
use crate::log_store::DEFAULT_MAX_LOG_ENTRIES;
use crate::session::DEFAULT_INITIALIZATION_TIMEOUT;

use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Serialize};

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_VERSION: u32 = 1;

pub const DEFAULT_IPC_PORT: u16 = 19876;

const MIN_INITIALIZATION_TIMEOUT_MS: u64 = 100;
const MAX_INITIALIZATION_TIMEOUT_MS: u64 = 600_000;

// ============================================
// CONFIG STRUCTS
// ============================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleConfig {
    #[serde(default = "default_max_log_entries")]
    pub max_log_entries: usize,
    #[serde(default = "default_initialization_timeout_ms")]
    pub initialization_timeout_ms: u64,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            max_log_entries: default_max_log_entries(),
            initialization_timeout_ms: default_initialization_timeout_ms(),
        }
    }
}

impl ConsoleConfig {
    pub fn initialization_timeout(&self) -> Duration {
        Duration::from_millis(self.initialization_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpcConfig {
    #[serde(default = "default_ipc_port")]
    pub port: u16,
    /// Fixed token for the bridge; a fresh one is generated per run when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
}

impl Default for IpcConfig {
    fn default() -> Self {
        Self {
            port: default_ipc_port(),
            auth_token: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectorConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub console: ConsoleConfig,

    #[serde(default)]
    pub ipc: IpcConfig,
}

impl Default for InspectorConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            console: ConsoleConfig::default(),
            ipc: IpcConfig::default(),
        }
    }
}

// ============================================
// DEFAULT FUNCTIONS
// ============================================

fn default_version() -> u32 {
    CONFIG_VERSION
}
fn default_max_log_entries() -> usize {
    DEFAULT_MAX_LOG_ENTRIES
}
fn default_initialization_timeout_ms() -> u64 {
    DEFAULT_INITIALIZATION_TIMEOUT.as_millis() as u64
}
fn default_ipc_port() -> u16 {
    DEFAULT_IPC_PORT
}

// ============================================
// IMPLEMENTATION
// ============================================

impl InspectorConfig {
    /// Load config from {config_dir}/config.json.
    ///
    /// # Returns
    ///
    /// Returns defaults if the file does not exist.
    /// Returns `Err(ConfigError)` if the file exists but is corrupted or invalid.
    pub fn load(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = Self::path(config_dir);

        if !config_path.exists() {
            info!(
                "Config file not found at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path).map_err(|e| {
            warn!("Failed to read config file: {e}");
            ConfigError::unreadable(&config_path, e)
        })?;

        let config: InspectorConfig = serde_json::from_str(&contents).map_err(|e| {
            warn!("Failed to parse config JSON: {e}");
            ConfigError::malformed(&config_path, e)
        })?;

        config.validate()?;

        info!("Config loaded from {}", config_path.display());
        Ok(config)
    }

    pub fn path(config_dir: &Path) -> PathBuf {
        config_dir.join(CONFIG_FILE_NAME)
    }

    /// Save config to {config_dir}/config.json using atomic write.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if validation, directory creation,
    /// serialization, the temp file write or the rename fails.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        self.validate()?;

        std::fs::create_dir_all(config_dir)
            .map_err(|e| ConfigError::unwritable(config_dir, e))?;

        let config_path = Self::path(config_dir);
        let temp_path = config_dir.join(format!("{CONFIG_FILE_NAME}.tmp"));

        let json = serde_json::to_string_pretty(self).map_err(|e| ConfigError::encode(e))?;

        std::fs::write(&temp_path, json).map_err(|e| ConfigError::unwritable(&temp_path, e))?;

        // A reader sees the old file or the new one, never a partial write
        std::fs::rename(&temp_path, &config_path)
            .map_err(|e| ConfigError::unwritable(&config_path, e))?;

        info!("Config saved to {}", config_path.display());
        Ok(())
    }

    /// Check every value against the range the console can work with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version == 0 || self.version > CONFIG_VERSION {
            return Err(ConfigError::invalid(
                "version",
                format!("{} is not a known version (expected 1-{CONFIG_VERSION})", self.version),
            ));
        }

        if self.console.max_log_entries == 0 {
            return Err(ConfigError::invalid(
                "console.max_log_entries",
                "must keep at least one log entry",
            ));
        }

        let timeout = self.console.initialization_timeout_ms;
        if !(MIN_INITIALIZATION_TIMEOUT_MS..=MAX_INITIALIZATION_TIMEOUT_MS).contains(&timeout) {
            return Err(ConfigError::invalid(
                "console.initialization_timeout_ms",
                format!(
                    "{timeout}ms is outside {MIN_INITIALIZATION_TIMEOUT_MS}-{MAX_INITIALIZATION_TIMEOUT_MS}ms"
                ),
            ));
        }

        if self.ipc.port == 0 {
            return Err(ConfigError::invalid(
                "ipc.port",
                "must be a fixed port, not 0",
            ));
        }

        if self.ipc.auth_token.as_deref().is_some_and(str::is_empty) {
            return Err(ConfigError::invalid(
                "ipc.auth_token",
                "leave unset for a per-run token instead of empty",
            ));
        }

        Ok(())
    }
}
