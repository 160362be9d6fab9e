//! Port and token the UI shell and transport bridge use to reach the IPC
//! server, written to `<config_dir>/ipc.json` once the server is bound.

use crate::error::InspectorAppError;

use common::ErrorLocation;

use std::fs;
use std::panic::Location;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const CONNECTION_FILE_NAME: &str = "ipc.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionInfo {
    port: u16,
    auth_token: String,
}

impl ConnectionInfo {
    pub fn new(port: u16, auth_token: String) -> Self {
        Self { port, auth_token }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn auth_token(&self) -> &str {
        &self.auth_token
    }

    pub fn path(config_dir: &Path) -> PathBuf {
        config_dir.join(CONNECTION_FILE_NAME)
    }

    /// Write the file through a temp file and rename, so a client never
    /// reads half of it.
    pub fn write(&self, config_dir: &Path) -> Result<PathBuf, InspectorAppError> {
        let path = Self::path(config_dir);
        let temp_path = config_dir.join(format!("{CONNECTION_FILE_NAME}.tmp"));

        let json = serde_json::to_string_pretty(self).map_err(|e| InspectorAppError::Inspector {
            message: format!("Failed to serialize connection info: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        fs::write(&temp_path, json).map_err(|e| InspectorAppError::Inspector {
            message: format!("Failed to write {}: {e}", temp_path.display()),
            location: ErrorLocation::from(Location::caller()),
        })?;

        fs::rename(&temp_path, &path).map_err(|e| InspectorAppError::Inspector {
            message: format!("Failed to write {}: {e}", path.display()),
            location: ErrorLocation::from(Location::caller()),
        })?;

        Ok(path)
    }

    /// Delete the file on shutdown. A file that is already gone is fine.
    pub fn remove(config_dir: &Path) -> Result<(), InspectorAppError> {
        match fs::remove_file(Self::path(config_dir)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(InspectorAppError::Inspector {
                message: format!("Failed to remove connection info: {e}"),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }
}
