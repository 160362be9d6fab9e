//! The inspector console session.
//!
//! [`Console`] owns the log store, the correlation index, the session
//! tracker and the archive of rendered events. It is plain `&mut self`
//! state; [`ConsoleHandle`] runs it on a single actor task so every
//! mutation is serialized.
//!
//! # Reset points
//!
//! Logs, correlation entries and archived events are dropped wholesale when
//! the session becomes ready and when the user clears the console. Nothing
//! else removes them, apart from log store eviction.

mod events;
mod handle;

pub use events::{ConsoleUpdate, InboundEvent, NoticeLevel};
pub use handle::ConsoleHandle;

use crate::classifier::classify;
use crate::config::ConsoleConfig;
use crate::correlation::{DisplaySource, RenderCorrelationIndex, ResolvedSource};
use crate::error::console::ConsoleError;
use crate::error::session::SessionError;
use crate::log_store::BoundedLogStore;
use crate::session::{SessionTracker, Transition};
use crate::transport::{Header, Transport};
use crate::validators::validate_agent_card;

use common::HttpStatusCode;

use models::display::DISPLAY_ID_PREFIX;
use models::{
    DebugLogEntry, DisplayContent, DisplayEntry, DisplayEntryBuilder, DisplayRole, ProtocolEvent,
    SessionState,
};

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use log::{debug, info, warn};
use serde_json::Value;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use url::Url;
use uuid::Uuid;

const MESSAGE_ID_PREFIX: &str = "msg-";

/// Posted back to the actor when an initialization timer runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TimerExpired {
    pub(crate) generation: u64,
}

pub fn new_display_id() -> String {
    format!("{DISPLAY_ID_PREFIX}{}", Uuid::new_v4())
}

pub fn new_message_id() -> String {
    format!("{MESSAGE_ID_PREFIX}{}", Uuid::new_v4())
}

pub struct Console {
    tracker: SessionTracker,
    store: BoundedLogStore,
    index: RenderCorrelationIndex,
    /// Owners of every event that produced a chat line since the last reset.
    archive: Vec<Arc<ProtocolEvent>>,
    context_id: Option<String>,
    headers: Vec<Header>,
    initialization_timeout: Duration,
    transport: Arc<dyn Transport>,
    state_tx: watch::Sender<SessionState>,
    updates_tx: broadcast::Sender<ConsoleUpdate>,
    timer_tx: mpsc::UnboundedSender<TimerExpired>,
    timer: Option<JoinHandle<()>>,
}

impl Console {
    pub(crate) fn new(
        config: &ConsoleConfig,
        transport: Arc<dyn Transport>,
        state_tx: watch::Sender<SessionState>,
        updates_tx: broadcast::Sender<ConsoleUpdate>,
        timer_tx: mpsc::UnboundedSender<TimerExpired>,
    ) -> Self {
        Self {
            tracker: SessionTracker::new(),
            store: BoundedLogStore::new(config.max_log_entries),
            index: RenderCorrelationIndex::new(),
            archive: Vec::new(),
            context_id: None,
            headers: Vec::new(),
            initialization_timeout: config.initialization_timeout(),
            transport,
            state_tx,
            updates_tx,
            timer_tx,
            timer: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.tracker.state()
    }

    /// Context id threaded into outbound messages, once an agent sent one.
    pub fn context_id(&self) -> Option<&str> {
        self.context_id.as_deref()
    }

    pub fn store(&self) -> &BoundedLogStore {
        &self.store
    }

    pub fn index(&self) -> &RenderCorrelationIndex {
        &self.index
    }

    pub fn archived_events(&self) -> usize {
        self.archive.len()
    }

    /// Start a new connection attempt.
    ///
    /// Any attempt in progress is abandoned, including its timer. An
    /// invalid URL changes nothing.
    pub fn connect(&mut self, input: &str, headers: Vec<Header>) -> Result<Url, SessionError> {
        let (url, transition) = self.tracker.request_connect(input)?;

        self.cancel_timer();
        self.context_id = None;
        self.headers = headers;
        self.publish_transition(transition);

        self.transport.connect(&url, &self.headers);
        Ok(url)
    }

    /// Send user text to the agent and draw it as a user line.
    pub fn send_message(&mut self, text: &str) -> Result<DisplayEntry, ConsoleError> {
        self.tracker.ensure_ready()?;

        if text.trim().is_empty() {
            return Err(SessionError::empty_message().into());
        }

        let message_id = new_message_id();
        let entry = DisplayEntryBuilder::default()
            .with_display_id(new_display_id())
            .with_role(DisplayRole::User)
            .with_content(DisplayContent::Plain {
                text: text.to_string(),
            })
            .build()?;

        self.index.register(
            entry.display_id.clone(),
            DisplaySource::Request {
                message_id: message_id.clone(),
            },
        );

        debug!("Sending {message_id} as {}", entry.display_id);
        self.transport
            .send_message(text, &message_id, self.context_id.as_deref());
        self.publish(ConsoleUpdate::Entry {
            entry: entry.clone(),
        });

        Ok(entry)
    }

    pub fn handle_inbound(&mut self, event: InboundEvent) -> Result<(), ConsoleError> {
        match event {
            InboundEvent::CardResolved { card } => self.on_card_resolved(card),
            InboundEvent::CardFailed { status, message } => self.on_card_failed(status, &message),
            InboundEvent::InitializationAck { success, error } => {
                self.on_initialization_ack(success, error.as_deref())
            }
            InboundEvent::AgentResponse { event } => {
                self.handle_event(event)?;
            }
            InboundEvent::DebugLog { entry } => self.on_debug_log(entry),
        }
        Ok(())
    }

    /// Classify one agent event and draw whatever it renders as.
    ///
    /// Returns the new entries, one per rendered line.
    pub fn handle_event(&mut self, event: ProtocolEvent) -> Result<Vec<DisplayEntry>, ConsoleError> {
        if let Some(context_id) = event.active_context_id() {
            if self.context_id.as_deref() != Some(context_id) {
                debug!("Context id is now {context_id}");
            }
            self.context_id = Some(context_id.to_string());
        }

        let intents = classify(&event).into_intents();
        if intents.is_empty() {
            debug!("Event {} ({:?}) renders nothing", event.id, event.kind());
            return Ok(Vec::new());
        }

        let event = Arc::new(event);
        let mut entries = Vec::with_capacity(intents.len());

        for intent in intents {
            let entry = DisplayEntryBuilder::from_intent(intent)
                .with_display_id(new_display_id())
                .build()?;
            self.index.register(
                entry.display_id.clone(),
                DisplaySource::Event(Arc::downgrade(&event)),
            );
            entries.push(entry);
        }

        self.archive.push(event);

        for entry in &entries {
            self.publish(ConsoleUpdate::Entry {
                entry: entry.clone(),
            });
        }

        Ok(entries)
    }

    pub(crate) fn handle_timer(&mut self, expired: TimerExpired) {
        if let Some(transition) = self.tracker.initialization_timed_out(expired.generation) {
            self.timer = None;
            warn!(
                "No initialization acknowledgment within {}ms",
                self.initialization_timeout.as_millis()
            );
            self.notice(
                NoticeLevel::Error,
                format!(
                    "Session initialization timed out after {}ms",
                    self.initialization_timeout.as_millis()
                ),
            );
            self.publish_transition(transition);
        }
    }

    /// Payload behind a chat line, if it can still be shown.
    pub fn display_source(&self, display_id: &str) -> Option<ResolvedSource> {
        self.index.lookup(display_id, &self.store)
    }

    /// Empty the console at the user's request.
    pub fn clear_all(&mut self) {
        info!("Clearing console");
        self.reset();
    }

    /// Drop logs, correlation entries and archived events.
    pub fn reset(&mut self) {
        self.store.clear();
        self.index.clear();
        self.archive.clear();
        self.publish(ConsoleUpdate::Cleared);
    }

    /// Stop the timer and release everything. Safe to call twice.
    pub fn dispose(&mut self) {
        self.cancel_timer();
        self.store.clear();
        self.index.clear();
        self.archive.clear();
        self.headers.clear();
        self.context_id = None;
        debug!("Console disposed");
    }

    fn on_card_resolved(&mut self, card: Value) {
        let Some(transition) = self.tracker.card_resolved() else {
            return;
        };

        let validation_errors = validate_agent_card(&card);
        if !validation_errors.is_empty() {
            warn!(
                "Agent card has {} validation error(s)",
                validation_errors.len()
            );
        }
        self.publish(ConsoleUpdate::AgentCard {
            card,
            validation_errors,
        });
        self.publish_transition(transition);

        if let Some(url) = self.tracker.agent_url().cloned() {
            self.transport.initialize_session(&url, &self.headers);
        }
        self.start_timer();
    }

    fn on_card_failed(&mut self, status: Option<HttpStatusCode>, message: &str) {
        let Some(transition) = self.tracker.card_failed() else {
            return;
        };

        let text = match status {
            Some(status) => format!(
                "Failed to fetch agent card ({status}, {}): {message}",
                status.describe()
            ),
            None => format!("Failed to fetch agent card: {message}"),
        };
        warn!("{text}");
        self.notice(NoticeLevel::Error, text);
        self.publish_transition(transition);
    }

    fn on_initialization_ack(&mut self, success: bool, error: Option<&str>) {
        let Some(transition) = self.tracker.initialization_acknowledged(success) else {
            return;
        };
        self.cancel_timer();

        if success {
            self.reset();
            info!("Session ready");
            self.notice(NoticeLevel::Info, "Session initialized".to_string());
        } else {
            let text = format!(
                "Session initialization failed: {}",
                error.unwrap_or("unknown error")
            );
            warn!("{text}");
            self.notice(NoticeLevel::Error, text);
        }
        self.publish_transition(transition);
    }

    fn on_debug_log(&mut self, entry: DebugLogEntry) {
        self.store.record_entry(&entry);

        let pretty_json =
            serde_json::to_string_pretty(&entry.data).unwrap_or_else(|_| entry.data.to_string());
        self.publish(ConsoleUpdate::DebugLine {
            channel: entry.channel,
            id: entry.id,
            timestamp: humantime::format_rfc3339_millis(SystemTime::now()).to_string(),
            pretty_json,
        });
    }

    fn start_timer(&mut self) {
        self.cancel_timer();

        let expired = TimerExpired {
            generation: self.tracker.generation(),
        };
        let deadline = Instant::now() + self.initialization_timeout;
        let timer_tx = self.timer_tx.clone();

        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            if timer_tx.send(expired).is_err() {
                debug!("Console gone before initialization timer fired");
            }
        }));
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }

    fn publish_transition(&self, transition: Transition) {
        self.state_tx.send_replace(transition.to);
        self.publish(ConsoleUpdate::SessionState {
            state: transition.to,
            previous: transition.from,
        });
    }

    fn notice(&self, level: NoticeLevel, message: String) {
        self.publish(ConsoleUpdate::Notice { level, message });
    }

    fn publish(&self, update: ConsoleUpdate) {
        // No subscribers is normal before the UI attaches.
        let _ = self.updates_tx.send(update);
    }
}

impl Drop for Console {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}
