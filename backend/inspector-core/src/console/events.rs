//! Messages in and out of the console.

use crate::validators::decode_agent_response;

use common::HttpStatusCode;

use models::{DebugLogEntry, DisplayEntry, LogChannel, ProtocolEvent, SessionState};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// What the transport bridge reports back.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundEvent {
    /// The agent card was fetched.
    CardResolved { card: Value },
    /// The agent card could not be fetched.
    CardFailed {
        #[serde(default)]
        status: Option<HttpStatusCode>,
        message: String,
    },
    /// Reply to `initialize_session`.
    InitializationAck {
        success: bool,
        #[serde(default)]
        error: Option<String>,
    },
    /// One agent response. Raw JSON is decoded and validated on the way in.
    AgentResponse {
        #[serde(deserialize_with = "deserialize_agent_response")]
        event: ProtocolEvent,
    },
    /// One raw log fragment.
    DebugLog { entry: DebugLogEntry },
}

fn deserialize_agent_response<'de, D>(deserializer: D) -> Result<ProtocolEvent, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(decode_agent_response(&raw))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Pushed to every UI subscriber.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConsoleUpdate {
    SessionState {
        state: SessionState,
        previous: SessionState,
    },
    /// A new chat line.
    Entry { entry: DisplayEntry },
    /// A new line for the debug panel.
    DebugLine {
        channel: LogChannel,
        id: String,
        timestamp: String,
        pretty_json: String,
    },
    AgentCard {
        card: Value,
        validation_errors: Vec<String>,
    },
    /// A message the UI should surface to the user.
    Notice { level: NoticeLevel, message: String },
    /// Chat and debug panels should be emptied.
    Cleared,
}
