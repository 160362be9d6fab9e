use common::ErrorLocation;

use models::SessionState;

use std::panic::Location;

use thiserror::Error as ThisError;

/// Input rejected at the console boundary. None of these mutate state.
#[derive(Debug, ThisError)]
pub enum SessionError {
    #[error("Invalid URL Error: '{input}': {reason} {location}")]
    InvalidUrl {
        input: String,
        reason: String,
        location: ErrorLocation,
    },

    #[error("Not Ready Error: input is disabled while session is {state} {location}")]
    NotReady {
        state: SessionState,
        location: ErrorLocation,
    },

    #[error("Empty Message Error: nothing to send {location}")]
    EmptyMessage { location: ErrorLocation },
}

impl SessionError {
    #[track_caller]
    pub fn invalid_url(input: impl Into<String>, reason: impl Into<String>) -> Self {
        SessionError::InvalidUrl {
            input: input.into(),
            reason: reason.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn not_ready(state: SessionState) -> Self {
        SessionError::NotReady {
            state,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn empty_message() -> Self {
        SessionError::EmptyMessage {
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Text suitable for the UI shell's alert.
    pub fn user_message(&self) -> String {
        match self {
            SessionError::InvalidUrl { input, .. } => {
                format!("Invalid agent card URL: {input}")
            }
            SessionError::NotReady { state, .. } => {
                format!("Cannot send while the session is {state}")
            }
            SessionError::EmptyMessage { .. } => String::from("Message is empty"),
        }
    }
}
