//! Actor wrapper around [`Console`].
//!
//! Commands are sent over an mpsc channel and processed one at a time by a
//! dedicated task, together with initialization timer expiries. Session
//! state reads go through a watch channel and never wait on the actor.

use crate::config::ConsoleConfig;
use crate::console::{Console, ConsoleUpdate, InboundEvent, TimerExpired};
use crate::correlation::ResolvedSource;
use crate::error::console::ConsoleError;
use crate::error::session::SessionError;
use crate::transport::{Header, Transport};

use models::{DisplayEntry, SessionState};

use std::sync::Arc;

use log::{info, warn};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use url::Url;

const COMMAND_CAPACITY: usize = 100;
const UPDATE_CAPACITY: usize = 256;

/// Requests the actor serves. Every command carries its reply channel.
enum ConsoleCommand {
    Connect {
        url: String,
        headers: Vec<Header>,
        reply: oneshot::Sender<Result<Url, SessionError>>,
    },
    SendMessage {
        text: String,
        reply: oneshot::Sender<Result<DisplayEntry, ConsoleError>>,
    },
    Deliver {
        event: InboundEvent,
        reply: oneshot::Sender<Result<(), ConsoleError>>,
    },
    GetDisplaySource {
        display_id: String,
        reply: oneshot::Sender<Option<ResolvedSource>>,
    },
    ClearAll {
        reply: oneshot::Sender<()>,
    },
    Dispose {
        reply: oneshot::Sender<()>,
    },
}

/// Handle to a running console.
///
/// `Clone` is cheap; all clones talk to the same actor. The actor stops
/// after [`dispose`](Self::dispose) or once every handle is dropped.
#[derive(Clone)]
pub struct ConsoleHandle {
    command_tx: mpsc::Sender<ConsoleCommand>,
    state_rx: watch::Receiver<SessionState>,
    updates_tx: broadcast::Sender<ConsoleUpdate>,
}

impl ConsoleHandle {
    /// Create a console and spawn its actor. Must be called inside a tokio
    /// runtime.
    pub fn spawn(config: &ConsoleConfig, transport: Arc<dyn Transport>) -> Self {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CAPACITY);
        let (timer_tx, timer_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(SessionState::default());
        let (updates_tx, _) = broadcast::channel(UPDATE_CAPACITY);

        let console = Console::new(config, transport, state_tx, updates_tx.clone(), timer_tx);
        tokio::spawn(console_actor(console, command_rx, timer_rx));

        Self {
            command_tx,
            state_rx,
            updates_tx,
        }
    }

    pub async fn connect(&self, url: &str, headers: Vec<Header>) -> Result<Url, ConsoleError> {
        let url = url.to_string();
        let result = self
            .request(|reply| ConsoleCommand::Connect {
                url,
                headers,
                reply,
            })
            .await?;
        Ok(result?)
    }

    pub async fn send_message(&self, text: &str) -> Result<DisplayEntry, ConsoleError> {
        let text = text.to_string();
        self.request(|reply| ConsoleCommand::SendMessage { text, reply })
            .await?
    }

    /// Hand the console something the transport bridge reported.
    pub async fn deliver(&self, event: InboundEvent) -> Result<(), ConsoleError> {
        self.request(|reply| ConsoleCommand::Deliver { event, reply })
            .await?
    }

    pub async fn get_display_source(
        &self,
        display_id: &str,
    ) -> Result<Option<ResolvedSource>, ConsoleError> {
        let display_id = display_id.to_string();
        self.request(|reply| ConsoleCommand::GetDisplaySource { display_id, reply })
            .await
    }

    pub async fn clear_all(&self) -> Result<(), ConsoleError> {
        self.request(|reply| ConsoleCommand::ClearAll { reply })
            .await
    }

    /// Stop the actor. Later calls on any clone fail with
    /// [`ConsoleError::ActorGone`].
    pub async fn dispose(&self) -> Result<(), ConsoleError> {
        self.request(|reply| ConsoleCommand::Dispose { reply })
            .await
    }

    pub fn state(&self) -> SessionState {
        *self.state_rx.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.state_rx.clone()
    }

    pub fn subscribe_updates(&self) -> broadcast::Receiver<ConsoleUpdate> {
        self.updates_tx.subscribe()
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> ConsoleCommand,
    ) -> Result<T, ConsoleError> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(command(reply_tx))
            .await
            .map_err(|_| ConsoleError::actor_gone("Console task has stopped"))?;

        reply_rx
            .await
            .map_err(|_| ConsoleError::actor_gone("Console task dropped the request"))
    }
}

/// The console actor task.
///
/// Owns the console and processes commands and timer expiries
/// sequentially until disposed or until every handle is gone.
async fn console_actor(
    mut console: Console,
    mut command_rx: mpsc::Receiver<ConsoleCommand>,
    mut timer_rx: mpsc::UnboundedReceiver<TimerExpired>,
) {
    info!("Console actor started");

    loop {
        tokio::select! {
            command = command_rx.recv() => {
                let Some(command) = command else {
                    break;
                };
                if let ConsoleCommand::Dispose { reply } = command {
                    console.dispose();
                    let _ = reply.send(());
                    break;
                }
                handle_command(&mut console, command);
            }
            Some(expired) = timer_rx.recv() => console.handle_timer(expired),
        }
    }

    console.dispose();
    info!("Console actor stopped");
}

fn handle_command(console: &mut Console, command: ConsoleCommand) {
    // A dropped reply receiver only means the caller stopped waiting.
    match command {
        ConsoleCommand::Connect {
            url,
            headers,
            reply,
        } => {
            let result = console.connect(&url, headers);
            if let Err(e) = &result {
                warn!("Connect rejected: {e}");
            }
            let _ = reply.send(result);
        }
        ConsoleCommand::SendMessage { text, reply } => {
            let _ = reply.send(console.send_message(&text));
        }
        ConsoleCommand::Deliver { event, reply } => {
            let _ = reply.send(console.handle_inbound(event));
        }
        ConsoleCommand::GetDisplaySource { display_id, reply } => {
            let _ = reply.send(console.display_source(&display_id));
        }
        ConsoleCommand::ClearAll { reply } => {
            console.clear_all();
            let _ = reply.send(());
        }
        ConsoleCommand::Dispose { reply } => {
            console.dispose();
            let _ = reply.send(());
        }
    }
}
