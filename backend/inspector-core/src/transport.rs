//! Outbound command surface towards the transport bridge.
//!
//! The console never talks to an agent itself. Card fetch, session
//! negotiation and header injection belong to the bridge; the console only
//! asks for them and learns the outcome through
//! [`InboundEvent`](crate::console::InboundEvent)s.

use common::RedactedValue;

use log::debug;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::broadcast;
use url::Url;

const DEFAULT_COMMAND_CAPACITY: usize = 64;

/// A custom HTTP header the user configured for the agent connection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: RedactedValue,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: RedactedValue::new(value),
        }
    }
}

/// Fire-and-forget requests to the bridge.
///
/// Implementations must not block; results come back asynchronously.
pub trait Transport: Send + Sync {
    fn connect(&self, url: &Url, headers: &[Header]);

    fn initialize_session(&self, url: &Url, headers: &[Header]);

    fn send_message(&self, text: &str, message_id: &str, context_id: Option<&str>);
}

/// One outbound request, as published by [`ChannelTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCommand {
    Connect {
        url: Url,
        headers: Vec<Header>,
    },
    InitializeSession {
        url: Url,
        headers: Vec<Header>,
    },
    SendMessage {
        text: String,
        message_id: String,
        context_id: Option<String>,
    },
}

impl TransportCommand {
    /// JSON for the bridge. This is the only place header values leave
    /// their redacted wrapper.
    pub fn to_wire(&self) -> Value {
        fn headers_to_wire(headers: &[Header]) -> Value {
            headers
                .iter()
                .map(|h| json!({ "name": h.name, "value": h.value.expose() }))
                .collect()
        }

        match self {
            TransportCommand::Connect { url, headers } => json!({
                "command": "connect",
                "url": url.as_str(),
                "headers": headers_to_wire(headers),
            }),
            TransportCommand::InitializeSession { url, headers } => json!({
                "command": "initialize_session",
                "url": url.as_str(),
                "headers": headers_to_wire(headers),
            }),
            TransportCommand::SendMessage {
                text,
                message_id,
                context_id,
            } => json!({
                "command": "send_message",
                "text": text,
                "messageId": message_id,
                "contextId": context_id,
            }),
        }
    }
}

/// [`Transport`] that publishes commands on a broadcast channel.
///
/// The IPC server relays them to connected bridge clients; tests subscribe
/// directly. With no subscriber a command is dropped, same as a bridge
/// that is not listening.
#[derive(Clone)]
pub struct ChannelTransport {
    tx: broadcast::Sender<TransportCommand>,
}

impl ChannelTransport {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(DEFAULT_COMMAND_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TransportCommand> {
        self.tx.subscribe()
    }

    fn publish(&self, command: TransportCommand) {
        if self.tx.send(command).is_err() {
            debug!("No transport bridge listening, command dropped");
        }
    }
}

impl Default for ChannelTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for ChannelTransport {
    fn connect(&self, url: &Url, headers: &[Header]) {
        self.publish(TransportCommand::Connect {
            url: url.clone(),
            headers: headers.to_vec(),
        });
    }

    fn initialize_session(&self, url: &Url, headers: &[Header]) {
        self.publish(TransportCommand::InitializeSession {
            url: url.clone(),
            headers: headers.to_vec(),
        });
    }

    fn send_message(&self, text: &str, message_id: &str, context_id: Option<&str>) {
        self.publish(TransportCommand::SendMessage {
            text: text.to_string(),
            message_id: message_id.to_string(),
            context_id: context_id.map(str::to_string),
        });
    }
}
