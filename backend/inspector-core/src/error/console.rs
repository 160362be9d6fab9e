use crate::error::session::SessionError;

use common::ErrorLocation;

use models::ModelError;

use std::panic::Location;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum ConsoleError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("Console Actor Gone Error: {message} {location}")]
    ActorGone {
        message: String,
        location: ErrorLocation,
    },
}

impl ConsoleError {
    #[track_caller]
    pub fn actor_gone(message: impl Into<String>) -> Self {
        ConsoleError::ActorGone {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Text suitable for the UI shell's alert.
    pub fn user_message(&self) -> String {
        match self {
            ConsoleError::Session(e) => e.user_message(),
            other => other.to_string(),
        }
    }

    /// Input validation failures, as opposed to a dead console task.
    pub fn is_rejection(&self) -> bool {
        matches!(self, ConsoleError::Session(_))
    }
}
