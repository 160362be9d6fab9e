use common::ErrorLocation;

use thiserror::Error;

/// Errors that stop the inspector from starting.
#[derive(Debug, Error)]
pub enum InspectorAppError {
    /// Error from this App
    #[error("Inspector Error: {message} {location}")]
    Inspector {
        message: String,
        location: ErrorLocation,
    },

    /// Error from inspector-core (config, IPC server)
    #[error("Core Error: {message} {location}")]
    Core {
        message: String,
        location: ErrorLocation,
    },

    /// No usable config directory
    #[error("Paths Error: {message} {location}")]
    Paths {
        message: String,
        location: ErrorLocation,
    },
}
