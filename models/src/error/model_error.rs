use crate::ErrorLocation;

use std::panic::Location;

use thiserror::Error as ThisError;

/// Why a chat line could not be assembled.
#[derive(Debug, ThisError)]
pub enum ModelError {
    #[error("Display Entry Error: {field} is required {location}")]
    MissingField {
        field: &'static str,
        location: ErrorLocation,
    },

    /// Display ids are minted by the console, never copied from a protocol id.
    #[error("Display Entry Error: display id must look like '{expected_prefix}<id>', got '{display_id}' {location}")]
    InvalidDisplayId {
        display_id: String,
        expected_prefix: &'static str,
        location: ErrorLocation,
    },
}

impl ModelError {
    #[track_caller]
    pub(crate) fn missing(field: &'static str) -> Self {
        ModelError::MissingField {
            field,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub(crate) fn invalid_display_id(display_id: String, expected_prefix: &'static str) -> Self {
        ModelError::InvalidDisplayId {
            display_id,
            expected_prefix,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
