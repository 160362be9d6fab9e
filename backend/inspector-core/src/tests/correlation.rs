// Unit tests for display id correlation

use crate::correlation::{DisplaySource, RenderCorrelationIndex, ResolvedSource};
use crate::log_store::BoundedLogStore;

use models::{EventBody, LogChannel, ProtocolEvent};

use std::sync::Arc;

use serde_json::json;

/// **VALUE**: Verifies a user line resolves to the request payload logged for its message id.
///
/// **WHY THIS MATTERS**: Clicking your own message shows exactly what went on the wire.
///
/// **BUG THIS CATCHES**: Would catch looking up the display id in the store instead of
/// the message id, or returning the response channel.
#[test]
fn given_request_source_when_logged_then_lookup_returns_request_payload() {
    let store = BoundedLogStore::new(10);
    store.record("msg-1", LogChannel::Request, json!({ "method": "message/send" }));
    store.record("msg-1", LogChannel::Response, json!({ "result": {} }));

    let mut index = RenderCorrelationIndex::new();
    index.register(
        "display-1",
        DisplaySource::Request {
            message_id: "msg-1".to_string(),
        },
    );

    let resolved = index.lookup("display-1", &store).unwrap();

    assert_eq!(
        resolved.to_json(),
        json!({ "messageId": "msg-1", "request": { "method": "message/send" } })
    );
}

/// **VALUE**: Verifies a request that was never logged (or was evicted) is a miss, not an error.
#[test]
fn given_request_not_in_store_when_lookup_then_none() {
    let store = BoundedLogStore::new(10);
    let mut index = RenderCorrelationIndex::new();
    index.register(
        "display-1",
        DisplaySource::Request {
            message_id: "msg-gone".to_string(),
        },
    );

    assert!(index.contains("display-1"));
    assert!(index.lookup("display-1", &store).is_none());
    assert!(index.lookup("display-unknown", &store).is_none());
}

/// **VALUE**: Verifies event sources resolve while the event is alive and not after.
///
/// **WHY THIS MATTERS**: The index must never keep event data alive on its own; the
/// console's reset releases events by dropping its archive.
///
/// **BUG THIS CATCHES**: Would catch the index holding a strong reference.
#[test]
fn given_event_source_when_owner_dropped_then_lookup_misses() {
    let store = BoundedLogStore::new(10);
    let event = Arc::new(
        ProtocolEvent::new("req-5", EventBody::Message { parts: Vec::new() })
            .with_context_id("ctx-1"),
    );

    let mut index = RenderCorrelationIndex::new();
    index.register("display-a", DisplaySource::Event(Arc::downgrade(&event)));
    index.register("display-b", DisplaySource::Event(Arc::downgrade(&event)));

    let resolved = index.lookup("display-a", &store).unwrap();
    assert_eq!(resolved.to_json()["id"], json!("req-5"));
    assert_eq!(resolved.to_json()["contextId"], json!("ctx-1"));
    match resolved {
        ResolvedSource::Event(resolved) => assert!(Arc::ptr_eq(&resolved, &event)),
        other => panic!("Expected event source, got {other:?}"),
    }

    drop(event);

    assert!(index.lookup("display-b", &store).is_none());
    assert_eq!(index.len(), 2);
}

/// **VALUE**: Verifies `clear` drops every entry.
#[test]
fn given_entries_when_cleared_then_empty() {
    let mut index = RenderCorrelationIndex::new();
    index.register(
        "display-1",
        DisplaySource::Request {
            message_id: "m".to_string(),
        },
    );

    index.clear();

    assert!(index.is_empty());
    assert!(!index.contains("display-1"));
}
