// Unit tests for the event classifier
// One test per dispatch rule, plus the error override and validation tagging

use crate::classifier::{Classification, classify};
use crate::validators::decode_agent_response;

use models::{DisplayContent, DisplayRole, ProtocolEvent};

use serde_json::{Value, json};

fn event(raw: Value) -> ProtocolEvent {
    serde_json::from_value(raw).unwrap()
}

/// **VALUE**: Verifies an error wins over whatever the kind would render.
///
/// **WHY THIS MATTERS**: Errors must never be hidden behind a normal progress line.
///
/// **BUG THIS CATCHES**: Would catch dispatching on kind before checking `error`.
#[test]
fn given_error_on_task_when_classified_then_single_error_line() {
    let classification = classify(&event(json!({
        "kind": "task",
        "id": "1",
        "error": "agent exploded",
        "status": { "state": "working" }
    })));

    let intents = classification.intents();
    assert_eq!(intents.len(), 1);
    assert_eq!(intents[0].role, DisplayRole::AgentError);
    assert_eq!(
        intents[0].content,
        DisplayContent::Plain {
            text: "[error] Error: agent exploded".to_string()
        }
    );
    assert_eq!(intents[0].kind_label.as_deref(), Some("task"));
}

/// **VALUE**: Verifies an empty error string does not count as an error.
#[test]
fn given_empty_error_when_classified_then_kind_dispatch_applies() {
    let classification = classify(&event(json!({
        "kind": "task",
        "id": "1",
        "error": "",
        "status": { "state": "submitted" }
    })));

    assert_eq!(classification.intents()[0].role, DisplayRole::AgentProgress);
}

/// **VALUE**: Verifies a task renders its state, and a task without status renders nothing.
#[test]
fn given_task_when_classified_then_progress_line_shows_state() {
    let with_status = classify(&event(json!({
        "kind": "task", "id": "1", "status": { "state": "submitted" }
    })));
    let without_status = classify(&event(json!({ "kind": "task", "id": "2" })));
    let empty_state = classify(&event(json!({
        "kind": "task", "id": "3", "status": {}
    })));

    assert_eq!(
        with_status.intents()[0].content,
        DisplayContent::Plain {
            text: "Task created with status: submitted".to_string()
        }
    );
    assert_eq!(without_status, Classification::NoRender);
    assert_eq!(
        empty_state.intents()[0].content,
        DisplayContent::Plain {
            text: "Task created with status: unknown".to_string()
        }
    );
}

/// **VALUE**: Verifies status updates render the first text part, and only when non-empty.
///
/// **BUG THIS CATCHES**: Would catch searching past an empty first part, which would
/// surface text the agent did not lead with.
#[test]
fn given_status_update_when_classified_then_first_text_part_is_progress() {
    let with_text = classify(&event(json!({
        "kind": "status-update",
        "id": "1",
        "status": {
            "state": "working",
            "message": { "parts": [{ "kind": "text", "text": "Looking it up" }] }
        }
    })));
    let empty_first = classify(&event(json!({
        "kind": "status-update",
        "id": "2",
        "status": {
            "state": "working",
            "message": { "parts": [{ "text": "" }, { "text": "later" }] }
        }
    })));
    let no_message = classify(&event(json!({
        "kind": "status-update", "id": "3", "status": { "state": "working" }
    })));

    let intent = &with_text.intents()[0];
    assert_eq!(intent.role, DisplayRole::AgentProgress);
    assert_eq!(
        intent.content,
        DisplayContent::Formatted {
            text: "Looking it up".to_string()
        }
    );
    assert_eq!(empty_first, Classification::NoRender);
    assert_eq!(no_message, Classification::NoRender);
}

/// **VALUE**: Verifies each artifact part becomes its own line, in order, and unsupported
/// parts are skipped.
///
/// **WHY THIS MATTERS**: A text + file + data artifact must show three inspectable lines.
///
/// **BUG THIS CATCHES**: Would catch collapsing parts into one line, reordering them, or
/// leaking an unsanitized MIME type into the link label.
#[test]
fn given_three_part_artifact_when_classified_then_three_agent_lines_in_order() {
    let classification = classify(&event(json!({
        "kind": "artifact-update",
        "id": "1",
        "artifact": {
            "artifactId": "art-1",
            "parts": [
                { "kind": "text", "text": "Here is the report" },
                { "kind": "file", "file": { "uri": "https://x/r.pdf", "mimeType": "Application/PDF; q=1" } },
                { "kind": "data", "data": { "rows": 2 } },
                { "kind": "video" }
            ]
        }
    })));

    let intents = classification.into_intents();
    assert_eq!(intents.len(), 3);
    assert!(intents.iter().all(|i| i.role == DisplayRole::Agent));
    assert_eq!(
        intents[0].content,
        DisplayContent::Formatted {
            text: "Here is the report".to_string()
        }
    );
    assert_eq!(
        intents[1].content,
        DisplayContent::FileLink {
            mime_type: "application/pdf".to_string(),
            uri: Some("https://x/r.pdf".to_string()),
        }
    );
    match &intents[2].content {
        DisplayContent::DataDump { pretty } => {
            assert_eq!(serde_json::from_str::<Value>(pretty).unwrap(), json!({ "rows": 2 }));
            assert!(pretty.contains('\n'), "dump should be pretty-printed");
        }
        other => panic!("Expected data dump, got {other:?}"),
    }
}

/// **VALUE**: Verifies a message renders its first non-empty text part.
#[test]
fn given_message_when_classified_then_first_non_empty_text_is_agent_line() {
    let classification = classify(&event(json!({
        "kind": "message",
        "id": "1",
        "role": "agent",
        "parts": [{ "text": "" }, { "data": { "x": 1 } }, { "text": "Hello!" }]
    })));
    let blank = classify(&event(json!({
        "kind": "message", "id": "2", "parts": [{ "text": "" }]
    })));

    let intents = classification.intents();
    assert_eq!(intents.len(), 1);
    assert_eq!(
        intents[0].content,
        DisplayContent::Formatted {
            text: "Hello!".to_string()
        }
    );
    assert_eq!(blank, Classification::NoRender);
}

/// **VALUE**: Verifies unknown kinds are inert.
///
/// **BUG THIS CATCHES**: Would catch a catch-all arm that renders raw JSON for new kinds.
#[test]
fn given_unknown_kind_when_classified_then_no_render() {
    let classification = classify(&event(json!({
        "kind": "push-notification-config",
        "id": "1",
        "parts": [{ "text": "ignored" }]
    })));

    assert_eq!(classification, Classification::NoRender);
}

/// **VALUE**: Verifies every intent carries the event's validation errors.
///
/// **WHY THIS MATTERS**: The UI marks invalid entries; the mark must survive on every
/// line an event produces.
#[test]
fn given_validation_errors_when_classified_then_each_intent_is_tagged() {
    let classification = classify(&event(json!({
        "kind": "artifact-update",
        "id": "1",
        "artifact": { "parts": [{ "text": "a" }, { "text": "b" }] },
        "validation_errors": ["Artifact is odd."]
    })));

    for intent in classification.intents() {
        assert_eq!(intent.validation_errors, vec!["Artifact is odd.".to_string()]);
        assert!(!intent.is_valid());
    }
}

/// **VALUE**: Verifies one malformed artifact part costs only its own line.
///
/// **WHY THIS MATTERS**: Agents under development send odd parts; the user must still see
/// every part that is well formed.
///
/// **BUG THIS CATCHES**: Would catch a wrongly typed part failing the decode of the whole
/// event and turning it into an inert unknown event.
#[test]
fn given_artifact_with_malformed_middle_part_when_decoded_then_two_lines() {
    let event = decode_agent_response(&json!({
        "kind": "artifact-update",
        "id": "req-1",
        "artifact": { "parts": [
            { "kind": "text", "text": "hi" },
            { "kind": "text", "text": 42 },
            { "kind": "file", "file": { "uri": "https://x/a.pdf", "mimeType": "application/pdf" } }
        ]}
    }));

    assert_eq!(event.kind(), Some("artifact-update"));
    assert!(
        event
            .validation_errors
            .iter()
            .all(|e| !e.starts_with("Response could not be decoded")),
        "{:?}",
        event.validation_errors
    );

    let intents = classify(&event).into_intents();
    assert_eq!(intents.len(), 2);
    assert_eq!(
        intents[0].content,
        DisplayContent::Formatted {
            text: "hi".to_string()
        }
    );
    assert!(matches!(intents[1].content, DisplayContent::FileLink { .. }));
}

/// **VALUE**: Verifies a task whose state is null still renders, labeled `unknown`.
#[test]
fn given_task_with_null_state_when_decoded_then_unknown_progress_line() {
    let event = decode_agent_response(&json!({
        "kind": "task",
        "id": "t-1",
        "status": { "state": null }
    }));

    let intents = classify(&event).into_intents();
    assert_eq!(intents.len(), 1);
    assert_eq!(
        intents[0].content,
        DisplayContent::Plain {
            text: "Task created with status: unknown".to_string()
        }
    );
}
