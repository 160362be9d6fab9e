//! Protocol events streamed back from an A2A agent.
//!
//! The transport bridge forwards every agent response as one JSON object
//! discriminated by `kind`. Decoding goes through a flat wire struct so that
//! a missing or unrecognized `kind` never fails the whole event: it lands in
//! [`EventBody::Unknown`] and renders nothing.

pub mod part;

use crate::protocol::part::Part;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

pub const TASK_KIND: &str = "task";
pub const STATUS_UPDATE_KIND: &str = "status-update";
pub const ARTIFACT_UPDATE_KIND: &str = "artifact-update";
pub const MESSAGE_KIND: &str = "message";

/// Lifecycle status attached to tasks and status updates.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TaskStatus {
    /// Empty when the agent sent no state or a non-string one.
    #[serde(default, deserialize_with = "lenient_state")]
    pub state: String,
    #[serde(
        default,
        deserialize_with = "lenient_message",
        skip_serializing_if = "Option::is_none"
    )]
    pub message: Option<StatusMessage>,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<String>,
}

fn lenient_state<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(state) => state,
        _ => String::new(),
    })
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Value::deserialize(deserializer)?
        .as_str()
        .map(str::to_string))
}

fn lenient_message<'de, D>(deserializer: D) -> Result<Option<StatusMessage>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(StatusMessage::deserialize(&value).ok())
}

/// The agent message nested in a status.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StatusMessage {
    #[serde(default)]
    pub parts: Vec<Part>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StatusMessage {
    /// Text of the first part, when that part is a non-empty text part.
    pub fn first_text(&self) -> Option<&str> {
        self.parts.first().and_then(Part::non_empty_text)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Artifact {
    #[serde(default, rename = "artifactId", skip_serializing_if = "Option::is_none")]
    pub artifact_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// Kind-specific payload of a [`ProtocolEvent`].
#[derive(Debug, Clone, PartialEq)]
pub enum EventBody {
    Task { status: Option<TaskStatus> },
    StatusUpdate { status: Option<TaskStatus> },
    ArtifactUpdate { artifact: Option<Artifact> },
    Message { parts: Vec<Part> },
    /// A kind this console does not know yet (or no kind at all).
    Unknown { kind: Option<String> },
}

impl EventBody {
    /// The wire discriminant, `None` only for kind-less events.
    pub fn kind(&self) -> Option<&str> {
        match self {
            EventBody::Task { .. } => Some(TASK_KIND),
            EventBody::StatusUpdate { .. } => Some(STATUS_UPDATE_KIND),
            EventBody::ArtifactUpdate { .. } => Some(ARTIFACT_UPDATE_KIND),
            EventBody::Message { .. } => Some(MESSAGE_KIND),
            EventBody::Unknown { kind } => kind.as_deref(),
        }
    }
}

/// One agent response as delivered to the console.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireEvent", into = "WireEvent")]
pub struct ProtocolEvent {
    /// Request id assigned by the transport bridge; shared with the debug log.
    pub id: String,
    pub context_id: Option<String>,
    pub error: Option<String>,
    pub body: EventBody,
    pub validation_errors: Vec<String>,
    /// Fields the console does not interpret, kept for raw inspection.
    pub extra: Map<String, Value>,
}

impl ProtocolEvent {
    pub fn new(id: impl Into<String>, body: EventBody) -> Self {
        Self {
            id: id.into(),
            context_id: None,
            error: None,
            body,
            validation_errors: Vec::new(),
            extra: Map::new(),
        }
    }

    pub fn with_context_id(mut self, context_id: impl Into<String>) -> Self {
        self.context_id = Some(context_id.into());
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_validation_errors(mut self, errors: Vec<String>) -> Self {
        self.validation_errors = errors;
        self
    }

    pub fn kind(&self) -> Option<&str> {
        self.body.kind()
    }

    /// Context id if present and non-empty.
    pub fn active_context_id(&self) -> Option<&str> {
        self.context_id.as_deref().filter(|c| !c.is_empty())
    }
}

#[derive(Serialize, Deserialize)]
struct WireEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(default)]
    id: String,
    #[serde(default, rename = "contextId", skip_serializing_if = "Option::is_none")]
    context_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    artifact: Option<Artifact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parts: Option<Vec<Part>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    validation_errors: Vec<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl From<WireEvent> for ProtocolEvent {
    fn from(wire: WireEvent) -> Self {
        let mut extra = wire.extra;
        let body = match wire.kind.as_deref() {
            Some(TASK_KIND) => EventBody::Task {
                status: wire.status,
            },
            Some(STATUS_UPDATE_KIND) => EventBody::StatusUpdate {
                status: wire.status,
            },
            Some(ARTIFACT_UPDATE_KIND) => EventBody::ArtifactUpdate {
                artifact: wire.artifact,
            },
            Some(MESSAGE_KIND) => EventBody::Message {
                parts: wire.parts.unwrap_or_default(),
            },
            _ => {
                // Unknown kinds keep whatever payload they had for inspection.
                let leftovers = [
                    ("status", wire.status.and_then(|v| serde_json::to_value(v).ok())),
                    ("artifact", wire.artifact.and_then(|v| serde_json::to_value(v).ok())),
                    ("parts", wire.parts.and_then(|v| serde_json::to_value(v).ok())),
                ];
                for (key, value) in leftovers {
                    if let Some(value) = value {
                        extra.insert(key.to_string(), value);
                    }
                }
                EventBody::Unknown { kind: wire.kind }
            }
        };

        ProtocolEvent {
            id: wire.id,
            context_id: wire.context_id,
            error: wire.error,
            body,
            validation_errors: wire.validation_errors,
            extra,
        }
    }
}

impl From<ProtocolEvent> for WireEvent {
    fn from(event: ProtocolEvent) -> Self {
        let kind = event.body.kind().map(str::to_string);
        let mut wire = WireEvent {
            kind,
            id: event.id,
            context_id: event.context_id,
            error: event.error,
            status: None,
            artifact: None,
            parts: None,
            validation_errors: event.validation_errors,
            extra: event.extra,
        };

        match event.body {
            EventBody::Task { status } | EventBody::StatusUpdate { status } => {
                wire.status = status;
            }
            EventBody::ArtifactUpdate { artifact } => wire.artifact = artifact,
            EventBody::Message { parts } => wire.parts = Some(parts),
            EventBody::Unknown { .. } => {}
        }

        wire
    }
}
