//! Structural checks for agent cards and agent responses.
//!
//! Validation never blocks rendering. The returned messages are attached to
//! the event (or published with the card) so the UI can flag the entry.

use models::protocol::{ARTIFACT_UPDATE_KIND, MESSAGE_KIND, STATUS_UPDATE_KIND, TASK_KIND};
use models::{EventBody, ProtocolEvent};

use log::warn;
use serde_json::{Map, Value};

const REQUIRED_CARD_FIELDS: [&str; 8] = [
    "name",
    "description",
    "url",
    "version",
    "capabilities",
    "defaultInputModes",
    "defaultOutputModes",
    "skills",
];

const MODE_FIELDS: [&str; 2] = ["defaultInputModes", "defaultOutputModes"];

const AGENT_ROLE: &str = "agent";

/// Check an agent card. An empty list means the card looks well-formed.
pub fn validate_agent_card(card: &Value) -> Vec<String> {
    let Some(card) = card.as_object() else {
        return vec![String::from("Agent card must be a JSON object.")];
    };

    let mut errors: Vec<String> = REQUIRED_CARD_FIELDS
        .iter()
        .filter(|field| !card.contains_key(**field))
        .map(|field| format!("Required field is missing: '{field}'."))
        .collect();

    if let Some(url) = card.get("url") {
        let absolute = url
            .as_str()
            .is_some_and(|u| u.starts_with("http://") || u.starts_with("https://"));
        if !absolute {
            errors.push(String::from(
                "Field 'url' must be an absolute URL starting with http:// or https://.",
            ));
        }
    }

    if card.get("capabilities").is_some_and(|c| !c.is_object()) {
        errors.push(String::from("Field 'capabilities' must be an object."));
    }

    for field in MODE_FIELDS {
        match card.get(field) {
            None => {}
            Some(Value::Array(items)) => {
                if !items.iter().all(Value::is_string) {
                    errors.push(format!("All items in '{field}' must be strings."));
                }
            }
            Some(_) => errors.push(format!("Field '{field}' must be an array of strings.")),
        }
    }

    match card.get("skills") {
        None => {}
        Some(Value::Array(skills)) if skills.is_empty() => errors.push(String::from(
            "Field 'skills' array is empty. Agent must have at least one skill if it performs actions.",
        )),
        Some(Value::Array(_)) => {}
        Some(_) => errors.push(String::from(
            "Field 'skills' must be an array of AgentSkill objects.",
        )),
    }

    errors
}

/// Check one agent response against the shape its `kind` promises.
pub fn validate_message(message: &Value) -> Vec<String> {
    let Some(kind) = message.get("kind") else {
        return vec![String::from(
            "Response from agent is missing required 'kind' field.",
        )];
    };

    let empty = Map::new();
    let fields = message.as_object().unwrap_or(&empty);

    match kind.as_str() {
        Some(TASK_KIND) => validate_task(fields),
        Some(STATUS_UPDATE_KIND) => validate_status_update(fields),
        Some(ARTIFACT_UPDATE_KIND) => validate_artifact_update(fields),
        Some(MESSAGE_KIND) => validate_agent_message(fields),
        Some(other) => vec![format!("Unknown message kind received: '{other}'.")],
        None => vec![format!("Unknown message kind received: '{kind}'.")],
    }
}

/// Decode a raw agent response, attaching its validation errors.
///
/// Errors already present on the payload are kept.
///
/// Never fails: a payload that cannot be decoded at all becomes an event of
/// unknown kind that carries the decode problem as a validation error, so
/// it still reaches the log and the inspection panel.
pub fn decode_agent_response(raw: &Value) -> ProtocolEvent {
    let mut errors = validate_message(raw);

    let mut event = match serde_json::from_value::<ProtocolEvent>(raw.clone()) {
        Ok(event) => event,
        Err(e) => {
            warn!("Undecodable agent response: {e}");
            errors.push(format!("Response could not be decoded: {e}."));

            let id = raw.get("id").and_then(Value::as_str).unwrap_or_default();
            let kind = raw.get("kind").and_then(Value::as_str).map(str::to_string);
            ProtocolEvent::new(id, EventBody::Unknown { kind })
        }
    };

    // Keep anything the bridge already reported, without duplicates.
    errors.retain(|e| !event.validation_errors.contains(e));
    event.validation_errors.extend(errors);
    event
}

fn has_status_state(fields: &Map<String, Value>) -> bool {
    fields
        .get("status")
        .and_then(Value::as_object)
        .is_some_and(|status| status.contains_key("state"))
}

fn validate_task(fields: &Map<String, Value>) -> Vec<String> {
    let mut errors = Vec::new();
    if !fields.contains_key("id") {
        errors.push(String::from("Task object missing required field: 'id'."));
    }
    if !has_status_state(fields) {
        errors.push(String::from(
            "Task object missing required field: 'status.state'.",
        ));
    }
    errors
}

fn validate_status_update(fields: &Map<String, Value>) -> Vec<String> {
    if has_status_state(fields) {
        Vec::new()
    } else {
        vec![String::from(
            "StatusUpdate object missing required field: 'status.state'.",
        )]
    }
}

fn validate_artifact_update(fields: &Map<String, Value>) -> Vec<String> {
    let Some(artifact) = fields.get("artifact") else {
        return vec![String::from(
            "ArtifactUpdate object missing required field: 'artifact'.",
        )];
    };

    let has_parts = artifact
        .get("parts")
        .and_then(Value::as_array)
        .is_some_and(|parts| !parts.is_empty());

    if has_parts {
        Vec::new()
    } else {
        vec![String::from(
            "Artifact object must have a non-empty 'parts' array.",
        )]
    }
}

fn validate_agent_message(fields: &Map<String, Value>) -> Vec<String> {
    let mut errors = Vec::new();

    let has_parts = fields
        .get("parts")
        .and_then(Value::as_array)
        .is_some_and(|parts| !parts.is_empty());
    if !has_parts {
        errors.push(String::from(
            "Message object must have a non-empty 'parts' array.",
        ));
    }

    if fields.get("role").and_then(Value::as_str) != Some(AGENT_ROLE) {
        errors.push(String::from(
            "Message from agent must have 'role' set to 'agent'.",
        ));
    }

    errors
}
