//! Display id to raw payload correlation.
//!
//! When the user inspects a chat line, the UI asks for the payload behind
//! its display id. Lines the user typed resolve through the log store's
//! request channel for the message id that was sent; agent lines resolve
//! to the event that produced them.
//!
//! The index never owns event data. It holds a [`Weak`] to the event the
//! console archived, so clearing the archive is enough to release it.

use crate::log_store::BoundedLogStore;

use models::{LogChannel, ProtocolEvent};

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use serde_json::{Value, json};

/// Where a displayed line came from.
#[derive(Debug, Clone)]
pub enum DisplaySource {
    /// A user-authored message; the payload lives in the log store.
    Request { message_id: String },
    /// An inbound event retained by the console.
    Event(Weak<ProtocolEvent>),
}

/// A successfully resolved source.
#[derive(Debug, Clone)]
pub enum ResolvedSource {
    Request { message_id: String, payload: Value },
    Event(Arc<ProtocolEvent>),
}

impl ResolvedSource {
    /// JSON shown in the inspection panel.
    pub fn to_json(&self) -> Value {
        match self {
            ResolvedSource::Request {
                message_id,
                payload,
            } => json!({ "messageId": message_id, "request": payload }),
            ResolvedSource::Event(event) => {
                serde_json::to_value(event.as_ref()).unwrap_or(Value::Null)
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct RenderCorrelationIndex {
    entries: HashMap<String, DisplaySource>,
}

impl RenderCorrelationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, display_id: impl Into<String>, source: DisplaySource) {
        self.entries.insert(display_id.into(), source);
    }

    /// Resolve `display_id`, or `None` when there is nothing to show.
    ///
    /// A miss is not an error: the id may be unknown, the request fragment
    /// may not have been logged yet (or was evicted), or the event may have
    /// been released by a reset.
    pub fn lookup(&self, display_id: &str, store: &BoundedLogStore) -> Option<ResolvedSource> {
        match self.entries.get(display_id)? {
            DisplaySource::Request { message_id } => store
                .payload(message_id, LogChannel::Request)
                .map(|payload| ResolvedSource::Request {
                    message_id: message_id.clone(),
                    payload,
                }),
            DisplaySource::Event(event) => event.upgrade().map(ResolvedSource::Event),
        }
    }

    pub fn contains(&self, display_id: &str) -> bool {
        self.entries.contains_key(display_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
