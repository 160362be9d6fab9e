//! Test helpers for IPC integration tests.
//!
//! This module provides utilities for testing the IPC WebSocket server:
//! - Starting a server on an ephemeral port
//! - Sending/receiving JSON frames
//! - Authentication helpers
//! - Connection state checks

use inspector_core::config::ConsoleConfig;
use inspector_core::console::ConsoleHandle;
use inspector_core::ipc::{IpcServerHandle, start_ipc_server};
use inspector_core::transport::ChannelTransport;

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

/// Test constants for authentication
pub const TEST_AUTH_TOKEN: &str = "test-token-12345";

const RECEIVE_TIMEOUT: Duration = Duration::from_secs(2);

pub type TestSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct TestServer {
    pub handle: IpcServerHandle,
    pub console: ConsoleHandle,
}

/// Test helper: Start a console and an IPC server in front of it.
pub async fn start_test_server() -> TestServer {
    let transport = ChannelTransport::new();
    let console = ConsoleHandle::spawn(&ConsoleConfig::default(), Arc::new(transport.clone()));
    let handle = start_ipc_server(
        0,
        Some(TEST_AUTH_TOKEN.to_string()),
        console.clone(),
        transport,
    )
    .await
    .expect("Failed to start IPC server");

    TestServer { handle, console }
}

/// Test helper: Connect to IPC server and return WebSocket stream.
pub async fn connect_to_server(ipc_port: u16) -> TestSocket {
    let url = format!("ws://127.0.0.1:{}", ipc_port);
    let (ws_stream, _) = connect_async(&url)
        .await
        .expect("Failed to connect to WebSocket server");
    ws_stream
}

/// Test helper: Send one JSON text frame.
pub async fn send_json(ws: &mut TestSocket, frame: &Value) {
    ws.send(Message::text(frame.to_string()))
        .await
        .expect("Failed to send message");
}

/// Test helper: Send a request envelope.
pub async fn send_request(ws: &mut TestSocket, request_id: u64, payload: Value) {
    send_json(ws, &json!({ "request_id": request_id, "payload": payload })).await;
}

/// Test helper: Receive and decode the next text frame.
pub async fn receive_json(ws: &mut TestSocket) -> Value {
    loop {
        let msg = tokio::time::timeout(RECEIVE_TIMEOUT, ws.next())
            .await
            .expect("Timed out waiting for a frame")
            .expect("No message received")
            .expect("Error receiving message");

        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).expect("Server sent invalid JSON");
        }
    }
}

/// Test helper: Skip frames until one matches.
pub async fn receive_until(ws: &mut TestSocket, matches: impl Fn(&Value) -> bool) -> Value {
    loop {
        let frame = receive_json(ws).await;
        if matches(&frame) {
            return frame;
        }
    }
}

/// Test helper: Gather frames until `done` holds for everything received so far.
///
/// Replies and pushed frames come from different tasks, so their relative
/// order is not fixed.
pub async fn collect_until(ws: &mut TestSocket, done: impl Fn(&[Value]) -> bool) -> Vec<Value> {
    let mut frames = Vec::new();
    while !done(&frames) {
        frames.push(receive_json(ws).await);
    }
    frames
}

/// Test helper: Wait for the reply to `request_id`, skipping pushed frames.
pub async fn receive_reply(ws: &mut TestSocket, request_id: u64) -> Value {
    receive_until(ws, |frame| frame["request_id"] == request_id).await
}

/// Test helper: Send auth handshake and return the response payload.
pub async fn authenticate(ws: &mut TestSocket, token: &str) -> Value {
    send_request(ws, 1, json!({ "type": "auth_handshake", "token": token })).await;

    let response = receive_json(ws).await;
    assert_eq!(response["request_id"], 1);
    assert_eq!(
        response["payload"]["type"], "auth_handshake_response",
        "Expected AuthHandshakeResponse, got {response}"
    );
    response["payload"].clone()
}

/// Test helper: Connect and authenticate, consuming the initial state snapshot.
pub async fn connect_authenticated(ipc_port: u16) -> TestSocket {
    let mut ws = connect_to_server(ipc_port).await;
    let auth = authenticate(&mut ws, TEST_AUTH_TOKEN).await;
    assert_eq!(auth["success"], true, "Auth should succeed");
    receive_until(&mut ws, is_state_update).await;
    ws
}

pub fn is_state_update(frame: &Value) -> bool {
    frame["payload"]["type"] == "update" && frame["payload"]["update"]["type"] == "session_state"
}

/// Test helper: Check if WebSocket connection is closed.
pub async fn is_connection_closed(ws: &mut TestSocket) -> bool {
    match tokio::time::timeout(Duration::from_millis(100), ws.next()).await {
        Err(_) => true,
        Ok(None) => true,
        Ok(Some(Ok(Message::Close(_)))) => true,
        Ok(Some(Ok(_))) => false,
        Ok(Some(Err(_))) => true,
    }
}
