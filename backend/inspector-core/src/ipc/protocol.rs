//! JSON frames exchanged with IPC clients.
//!
//! Every client frame is an envelope `{ "request_id": n, "payload": {...} }`
//! whose payload is tagged by `type`. Server replies echo the request id;
//! pushed updates and relayed transport commands use request id 0.

use crate::console::{ConsoleUpdate, InboundEvent};
use crate::transport::Header;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request id of frames the server sends on its own.
pub const PUSH_REQUEST_ID: u64 = 0;

/// Request id of the auth handshake response.
pub const AUTH_REQUEST_ID: u64 = 1;

#[derive(Debug, Deserialize)]
pub struct IpcClientMessage {
    #[serde(default)]
    pub request_id: u64,
    pub payload: ClientPayload,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientPayload {
    AuthHandshake {
        token: String,
    },
    Connect {
        url: String,
        #[serde(default)]
        headers: Vec<Header>,
    },
    SendMessage {
        text: String,
    },
    GetDisplaySource {
        display_id: String,
    },
    ClearAll,
    /// Transport bridge reporting back.
    Inbound {
        event: InboundEvent,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IpcErrorCode {
    InvalidMessage,
    AuthError,
    /// The console refused the request (bad URL, not ready, empty text).
    Rejected,
    InternalError,
}

#[derive(Debug, Serialize)]
pub struct IpcServerMessage {
    pub request_id: u64,
    pub payload: ServerPayload,
}

impl IpcServerMessage {
    pub fn reply(request_id: u64, payload: ServerPayload) -> Self {
        Self {
            request_id,
            payload,
        }
    }

    pub fn push(payload: ServerPayload) -> Self {
        Self::reply(PUSH_REQUEST_ID, payload)
    }

    pub fn error(request_id: u64, code: IpcErrorCode, message: impl Into<String>) -> Self {
        Self::reply(
            request_id,
            ServerPayload::Error {
                code,
                message: message.into(),
            },
        )
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerPayload {
    AuthHandshakeResponse {
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    Ack {
        #[serde(skip_serializing_if = "Option::is_none")]
        result: Option<Value>,
    },
    DisplaySource {
        display_id: String,
        /// `null` when the line cannot be inspected (unknown, evicted, reset).
        source: Option<Value>,
    },
    Update {
        update: ConsoleUpdate,
    },
    TransportCommand {
        command: Value,
    },
    Error {
        code: IpcErrorCode,
        message: String,
    },
}
