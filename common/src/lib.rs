//! Shared building blocks for the A2A inspector workspace.
//!
//! Everything here is free of inspector semantics: error location capture,
//! HTTP status classification and secret-carrying header values. The
//! `models` and `inspector-core` crates build on top of it.

pub mod error;
pub mod http_status;
pub mod redacted_value;

pub use error::error_location::ErrorLocation;
pub use error::redact_error::RedactError;
pub use http_status::HttpStatusCode;
pub use redacted_value::RedactedValue;

#[cfg(test)]
mod tests;
