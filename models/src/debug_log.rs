//! Raw log fragments reported by the transport bridge.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which side of an exchange a log fragment belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogChannel {
    Request,
    Response,
    Error,
    ValidationError,
}

impl LogChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogChannel::Request => "request",
            LogChannel::Response => "response",
            LogChannel::Error => "error",
            LogChannel::ValidationError => "validation_error",
        }
    }
}

impl std::fmt::Display for LogChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One fragment: `{ "type": "request", "id": "...", "data": {...} }`.
///
/// Several entries share an `id` when they describe the same exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugLogEntry {
    #[serde(rename = "type")]
    pub channel: LogChannel,
    pub id: String,
    #[serde(default)]
    pub data: Value,
}

impl DebugLogEntry {
    pub fn new(channel: LogChannel, id: impl Into<String>, data: Value) -> Self {
        Self {
            channel,
            id: id.into(),
            data,
        }
    }
}
