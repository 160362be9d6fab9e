//! HTTP status codes reported by the transport bridge.

use serde::{Deserialize, Serialize};

/// Status code of a failed agent card retrieval.
///
/// Kept as the raw number; the bridge reports it verbatim and the console
/// only needs to classify it for the user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HttpStatusCode(pub u16);

impl HttpStatusCode {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.0)
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.0)
    }

    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.0)
    }

    /// Short description used in notices ("not found", "server error", ...).
    pub fn describe(&self) -> &'static str {
        match self.0 {
            401 | 403 => "unauthorized",
            404 => "not found",
            408 | 504 => "timed out",
            _ if self.is_client_error() => "rejected by agent",
            _ if self.is_server_error() => "agent server error",
            _ => "unexpected status",
        }
    }
}

impl From<u16> for HttpStatusCode {
    fn from(code: u16) -> Self {
        HttpStatusCode(code)
    }
}

impl std::fmt::Display for HttpStatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
