use common::ErrorLocation;

use std::io;
use std::panic::Location;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Failures loading or saving `config.json`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Inspector Config Error: cannot read {path}: {source} {location}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
        location: ErrorLocation,
    },

    /// The file exists but is not a config this version understands.
    #[error("Inspector Config Error: {path} is not valid config JSON: {source} {location}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
        location: ErrorLocation,
    },

    #[error("Inspector Config Error: cannot write {path}: {source} {location}")]
    Unwritable {
        path: PathBuf,
        #[source]
        source: io::Error,
        location: ErrorLocation,
    },

    #[error("Inspector Config Error: cannot encode config: {source} {location}")]
    Encode {
        #[source]
        source: serde_json::Error,
        location: ErrorLocation,
    },

    #[error("Inspector Config Error: {field}: {reason} {location}")]
    InvalidValue {
        field: &'static str,
        reason: String,
        location: ErrorLocation,
    },
}

impl ConfigError {
    #[track_caller]
    pub(crate) fn unreadable(path: &Path, source: io::Error) -> Self {
        ConfigError::Unreadable {
            path: path.to_path_buf(),
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub(crate) fn malformed(path: &Path, source: serde_json::Error) -> Self {
        ConfigError::Malformed {
            path: path.to_path_buf(),
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub(crate) fn unwritable(path: &Path, source: io::Error) -> Self {
        ConfigError::Unwritable {
            path: path.to_path_buf(),
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub(crate) fn encode(source: serde_json::Error) -> Self {
        ConfigError::Encode {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field,
            reason: reason.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
