use crate::ipc_tests::helpers::{
    TEST_AUTH_TOKEN, authenticate, collect_until, connect_authenticated, connect_to_server,
    is_connection_closed, is_state_update, receive_json, receive_reply, receive_until,
    send_json, send_request, start_test_server,
};

use models::SessionState;

use serde_json::{Value, json};

fn agent_card() -> Value {
    json!({
        "name": "Echo",
        "description": "Echoes input.",
        "url": "http://localhost:9999/",
        "version": "1.0.0",
        "capabilities": {},
        "defaultInputModes": ["text/plain"],
        "defaultOutputModes": ["text/plain"],
        "skills": [{ "id": "echo" }]
    })
}

fn has_reply(frames: &[Value], request_id: u64) -> bool {
    frames.iter().any(|f| f["request_id"] == request_id)
}

fn find_command<'a>(frames: &'a [Value], command: &str) -> Option<&'a Value> {
    frames
        .iter()
        .find(|f| f["payload"]["type"] == "transport_command" && f["payload"]["command"]["command"] == command)
}

fn has_command(frames: &[Value], command: &str) -> bool {
    find_command(frames, command).is_some()
}

fn has_state(frames: &[Value], state: &str) -> bool {
    frames
        .iter()
        .any(|f| is_state_update(f) && f["payload"]["update"]["state"] == state)
}

/// **VALUE**: Verifies a client with the right token is accepted and told the session state.
///
/// **WHY THIS MATTERS**: A freshly attached UI must render the current state without
/// waiting for the next transition.
///
/// **BUG THIS CATCHES**: Would catch the snapshot being skipped or sent before the auth
/// response.
#[tokio::test]
async fn given_valid_token_when_authenticating_then_success_and_state_snapshot() {
    // GIVEN: IPC server running on an ephemeral port
    let server = start_test_server().await;
    let mut ws = connect_to_server(server.handle.port()).await;

    // WHEN: Client authenticates with the right token
    let auth = authenticate(&mut ws, TEST_AUTH_TOKEN).await;

    // THEN: Auth succeeds and the idle state follows
    assert_eq!(auth["success"], true);
    let snapshot = receive_json(&mut ws).await;
    assert!(is_state_update(&snapshot), "unexpected frame {snapshot}");
    assert_eq!(snapshot["request_id"], 0);
    assert_eq!(snapshot["payload"]["update"]["state"], "idle");
}

/// **VALUE**: Verifies a wrong token is refused and the connection closed.
///
/// **WHY THIS MATTERS**: Any local process can open the port; the token is the only gate.
///
/// **BUG THIS CATCHES**: Would catch the server serving requests after a failed handshake.
#[tokio::test]
async fn given_wrong_token_when_authenticating_then_rejected_and_closed() {
    let server = start_test_server().await;
    let mut ws = connect_to_server(server.handle.port()).await;

    let auth = authenticate(&mut ws, "wrong-token").await;

    assert_eq!(auth["success"], false);
    assert_eq!(auth["error"], "Invalid authentication token");
    assert!(
        is_connection_closed(&mut ws).await,
        "Connection should close after failed auth"
    );
}

/// **VALUE**: Verifies anything but a handshake as the first frame closes the connection.
#[tokio::test]
async fn given_request_before_auth_when_sent_then_connection_closed() {
    let server = start_test_server().await;
    let mut ws = connect_to_server(server.handle.port()).await;

    send_request(&mut ws, 2, json!({ "type": "clear_all" })).await;

    assert!(is_connection_closed(&mut ws).await);
}

/// **VALUE**: Verifies connect is acknowledged with the normalized URL and relayed to the
/// transport bridge with header values in the clear.
///
/// **WHY THIS MATTERS**: Headers are redacted everywhere except the frame the bridge uses
/// to reach the agent.
///
/// **BUG THIS CATCHES**: Would catch the redacted placeholder being sent as the header
/// value, or the URL not being normalized before the bridge sees it.
#[tokio::test]
async fn given_connect_request_when_sent_then_ack_and_transport_command() {
    // GIVEN: An authenticated client
    let server = start_test_server().await;
    let mut ws = connect_authenticated(server.handle.port()).await;

    // WHEN: It asks to connect with a custom header
    send_request(
        &mut ws,
        2,
        json!({
            "type": "connect",
            "url": "localhost:9999",
            "headers": [{ "name": "X-API-Key", "value": "secret-key" }]
        }),
    )
    .await;

    // THEN: Ack, state change and relayed command all arrive
    let frames = collect_until(&mut ws, |frames| {
        has_reply(frames, 2) && has_command(frames, "connect") && has_state(frames, "fetching-card")
    })
    .await;

    let ack = frames.iter().find(|f| f["request_id"] == 2).unwrap();
    assert_eq!(ack["payload"]["type"], "ack");
    assert_eq!(ack["payload"]["result"]["url"], "http://localhost:9999/");

    let command = &find_command(&frames, "connect").unwrap()["payload"]["command"];
    assert_eq!(command["url"], "http://localhost:9999/");
    assert_eq!(command["headers"][0]["name"], "X-API-Key");
    assert_eq!(command["headers"][0]["value"], "secret-key");
}

/// **VALUE**: Verifies the full bridge round trip: card, initialization, send, response,
/// inspection.
///
/// **WHY THIS MATTERS**: This is the path every real session takes through the server.
///
/// **BUG THIS CATCHES**: Would catch inbound events not reaching the console, the context
/// id not being threaded into the next send, or agent lines that cannot be inspected.
#[tokio::test]
async fn given_bridge_events_when_delivered_then_session_ready_and_lines_inspectable() {
    // GIVEN: An authenticated client that started a connection
    let server = start_test_server().await;
    let mut ws = connect_authenticated(server.handle.port()).await;
    send_request(&mut ws, 2, json!({ "type": "connect", "url": "http://localhost:9999" })).await;
    receive_reply(&mut ws, 2).await;

    // WHEN: The bridge reports the card and the initialization ack
    send_request(
        &mut ws,
        3,
        json!({ "type": "inbound", "event": { "type": "card_resolved", "card": agent_card() } }),
    )
    .await;
    let frames = collect_until(&mut ws, |frames| {
        has_reply(frames, 3) && has_command(frames, "initialize_session")
    })
    .await;
    assert!(frames.iter().any(|f| f["payload"]["update"]["type"] == "agent_card"));

    send_request(
        &mut ws,
        4,
        json!({ "type": "inbound", "event": { "type": "initialization_ack", "success": true } }),
    )
    .await;
    collect_until(&mut ws, |frames| has_reply(frames, 4) && has_state(frames, "ready")).await;

    // THEN: The console is ready
    assert_eq!(server.console.state(), SessionState::Ready);

    // WHEN: The agent answers with a context id
    send_request(
        &mut ws,
        5,
        json!({
            "type": "inbound",
            "event": {
                "type": "agent_response",
                "event": {
                    "kind": "message",
                    "id": "req-1",
                    "contextId": "ctx-42",
                    "role": "agent",
                    "parts": [{ "kind": "text", "text": "Hello there" }]
                }
            }
        }),
    )
    .await;
    let frames = collect_until(&mut ws, |frames| {
        has_reply(frames, 5)
            && frames
                .iter()
                .any(|f| f["payload"]["update"]["type"] == "entry")
    })
    .await;
    let entry = frames
        .iter()
        .find(|f| f["payload"]["update"]["type"] == "entry")
        .unwrap()["payload"]["update"]["entry"]
        .clone();
    let display_id = entry["display_id"].as_str().unwrap().to_string();

    // THEN: The line resolves to the raw event
    send_request(
        &mut ws,
        6,
        json!({ "type": "get_display_source", "display_id": display_id }),
    )
    .await;
    let source = receive_reply(&mut ws, 6).await;
    assert_eq!(source["payload"]["type"], "display_source");
    assert_eq!(source["payload"]["source"]["id"], "req-1");

    // WHEN: The user sends a follow-up
    send_request(&mut ws, 7, json!({ "type": "send_message", "text": "And you?" })).await;
    let frames = collect_until(&mut ws, |frames| {
        has_reply(frames, 7) && has_command(frames, "send_message")
    })
    .await;

    // THEN: It is acknowledged and carries the agent's context id
    let ack = frames.iter().find(|f| f["request_id"] == 7).unwrap();
    assert_eq!(ack["payload"]["type"], "ack");
    let command = &find_command(&frames, "send_message").unwrap()["payload"]["command"];
    assert_eq!(command["text"], "And you?");
    assert_eq!(command["contextId"], "ctx-42");
}

/// **VALUE**: Verifies unknown display ids resolve to `null` rather than an error.
#[tokio::test]
async fn given_unknown_display_id_when_requested_then_null_source() {
    let server = start_test_server().await;
    let mut ws = connect_authenticated(server.handle.port()).await;

    send_request(
        &mut ws,
        2,
        json!({ "type": "get_display_source", "display_id": "display-missing" }),
    )
    .await;

    let reply = receive_reply(&mut ws, 2).await;
    assert_eq!(reply["payload"]["type"], "display_source");
    assert_eq!(reply["payload"]["display_id"], "display-missing");
    assert!(reply["payload"]["source"].is_null());
}

/// **VALUE**: Verifies a second handshake on an authenticated connection is an error.
#[tokio::test]
async fn given_authenticated_when_handshake_repeated_then_auth_error() {
    let server = start_test_server().await;
    let mut ws = connect_authenticated(server.handle.port()).await;

    send_request(
        &mut ws,
        2,
        json!({ "type": "auth_handshake", "token": TEST_AUTH_TOKEN }),
    )
    .await;

    let reply = receive_reply(&mut ws, 2).await;
    assert_eq!(reply["payload"]["type"], "error");
    assert_eq!(reply["payload"]["code"], "auth_error");
}

/// **VALUE**: Verifies a malformed frame gets an error reply and the connection survives.
///
/// **BUG THIS CATCHES**: Would catch one bad frame tearing down the client.
#[tokio::test]
async fn given_invalid_json_when_sent_then_invalid_message_and_still_connected() {
    let server = start_test_server().await;
    let mut ws = connect_authenticated(server.handle.port()).await;

    send_json(&mut ws, &json!({ "payload": { "type": "no_such_request" } })).await;

    let reply = receive_until(&mut ws, |f| f["payload"]["type"] == "error").await;
    assert_eq!(reply["request_id"], 0);
    assert_eq!(reply["payload"]["code"], "invalid_message");

    send_request(&mut ws, 3, json!({ "type": "clear_all" })).await;
    let reply = receive_reply(&mut ws, 3).await;
    assert_eq!(reply["payload"]["type"], "ack");
}

/// **VALUE**: Verifies sending while idle is rejected with a message the UI can show.
///
/// **WHY THIS MATTERS**: Input must stay disabled until the session is ready; the UI shows
/// this text in its alert.
#[tokio::test]
async fn given_idle_session_when_send_message_then_rejected() {
    let server = start_test_server().await;
    let mut ws = connect_authenticated(server.handle.port()).await;

    send_request(&mut ws, 2, json!({ "type": "send_message", "text": "hello" })).await;

    let reply = receive_reply(&mut ws, 2).await;
    assert_eq!(reply["payload"]["type"], "error");
    assert_eq!(reply["payload"]["code"], "rejected");
    assert_eq!(
        reply["payload"]["message"],
        "Cannot send while the session is idle"
    );
}

/// **VALUE**: Verifies an unparseable agent URL is rejected without a state change.
#[tokio::test]
async fn given_invalid_url_when_connecting_then_rejected_and_still_idle() {
    let server = start_test_server().await;
    let mut ws = connect_authenticated(server.handle.port()).await;

    send_request(&mut ws, 2, json!({ "type": "connect", "url": "http://" })).await;

    let reply = receive_reply(&mut ws, 2).await;
    assert_eq!(reply["payload"]["code"], "rejected");
    assert_eq!(server.console.state(), SessionState::Idle);
}
