//! IPC WebSocket server implementation.
//!
//! The UI shell and the transport bridge both talk to the console through
//! this server:
//!
//! - Listens on localhost only
//! - Uses JSON text frames (see [`protocol`](crate::ipc::protocol))
//! - Requires an authentication handshake as the first frame
//! - Pushes console updates and relays transport commands to every
//!   authenticated client
//!
//! # Security
//!
//! - Binds to `127.0.0.1` only (no network exposure)
//! - Rejects non-loopback connections
//! - Closes the connection on a wrong token or any other first frame

use crate::IPC_HOSTNAME;
use crate::console::{ConsoleHandle, ConsoleUpdate};
use crate::error::ipc::IpcError;
use crate::ipc::connection_state::ConnectionState;
use crate::ipc::handle::IpcServerHandle;
use crate::ipc::protocol::{
    AUTH_REQUEST_ID, ClientPayload, IpcClientMessage, IpcErrorCode, IpcServerMessage,
    ServerPayload,
};
use crate::transport::{ChannelTransport, TransportCommand};

use common::{ErrorLocation, RedactedValue};

use std::net::SocketAddr;
use std::panic::Location;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use serde_json::json;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{WebSocketStream, accept_async};
use uuid::Uuid;

type WsSink = SplitSink<WebSocketStream<TcpStream>, Message>;
type WsSource = SplitStream<WebSocketStream<TcpStream>>;
type Outbound = mpsc::UnboundedSender<IpcServerMessage>;

/// Starts the IPC WebSocket server on `127.0.0.1:<ipc_port>`.
///
/// Port 0 binds an ephemeral port; read it back from
/// [`IpcServerHandle::local_addr`]. When `auth_token` is `None` a random
/// token is generated.
///
/// # Errors
///
/// Returns [`IpcError::Io`] if the port cannot be bound.
pub async fn start_ipc_server(
    ipc_port: u16,
    auth_token: Option<String>,
    console: ConsoleHandle,
    transport: ChannelTransport,
) -> Result<IpcServerHandle, IpcError> {
    let auth_token = RedactedValue::new(auth_token.unwrap_or_else(|| {
        info!("No IPC auth token configured, generating one");
        Uuid::new_v4().to_string()
    }));

    let address = format!("{IPC_HOSTNAME}:{ipc_port}");
    let listener = TcpListener::bind(&address).await?;
    let local_addr = listener.local_addr()?;

    info!("IPC server listening on {}", local_addr);

    let accept_task = tokio::spawn(accept_loop(
        listener,
        auth_token.clone(),
        console,
        transport,
    ));

    Ok(IpcServerHandle {
        local_addr,
        auth_token,
        accept_task,
    })
}

/// Accepts connections until aborted. Dropping the join set on abort
/// closes every open connection with it.
async fn accept_loop(
    listener: TcpListener,
    auth_token: RedactedValue,
    console: ConsoleHandle,
    transport: ChannelTransport,
) {
    let mut connections = JoinSet::new();

    while let Ok((stream, addr)) = listener.accept().await {
        while connections.try_join_next().is_some() {}

        info!("Client connecting from {}", addr);
        let auth_token = auth_token.clone();
        let console = console.clone();
        let transport = transport.clone();
        connections.spawn(async move {
            if let Err(e) = handle_connection(stream, addr, auth_token, console, transport).await {
                error!("IPC connection {} failed: {}", addr, e);
            }
        });
    }

    warn!("IPC accept loop stopped");
}

/// Serves one WebSocket connection.
///
/// 1. Rejects non-loopback peers
/// 2. Requires `auth_handshake` with the right token as the first frame
/// 3. Sends the current session state, then serves requests while pushing
///    console updates and transport commands
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    auth_token: RedactedValue,
    console: ConsoleHandle,
    transport: ChannelTransport,
) -> Result<(), IpcError> {
    // SECURITY: Reject non-loopback connections
    if !addr.ip().is_loopback() {
        warn!("Rejected non-loopback connection from {}", addr);
        return Ok(());
    }

    let ws_stream = accept_async(stream).await.map_err(|e| IpcError::Handshake {
        message: format!("WebSocket handshake failed: {e}"),
        location: ErrorLocation::from(Location::caller()),
    })?;

    let (mut write, mut read) = ws_stream.split();
    let mut state = ConnectionState::new(auth_token);

    if !authenticate(&mut read, &mut write, &mut state, addr).await? {
        return Ok(());
    }

    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let writer = tokio::spawn(write_frames(write, outbound_rx));
    let updates = tokio::spawn(forward(
        console.subscribe_updates(),
        outbound_tx.clone(),
        |update| ServerPayload::Update { update },
    ));
    let commands = tokio::spawn(forward(
        transport.subscribe(),
        outbound_tx.clone(),
        |command: TransportCommand| ServerPayload::TransportCommand {
            command: command.to_wire(),
        },
    ));

    let current = console.state();
    let snapshot = IpcServerMessage::push(ServerPayload::Update {
        update: ConsoleUpdate::SessionState {
            state: current,
            previous: current,
        },
    });
    let result = if outbound_tx.send(snapshot).is_ok() {
        read_requests(&mut read, &console, &outbound_tx, addr).await
    } else {
        Ok(())
    };

    updates.abort();
    commands.abort();
    drop(outbound_tx);

    match writer.await {
        Ok(Err(e)) => warn!("Writer for {} stopped: {}", addr, e),
        Err(e) if e.is_panic() => error!("Writer for {} panicked", addr),
        _ => {}
    }

    result
}

/// Handles the first frame. Returns whether the client may continue.
async fn authenticate(
    read: &mut WsSource,
    write: &mut WsSink,
    state: &mut ConnectionState,
    addr: SocketAddr,
) -> Result<bool, IpcError> {
    let Some(first) = read.next().await else {
        warn!("Client {} disconnected before sending auth", addr);
        return Ok(false);
    };

    let first = first.map_err(|e| IpcError::Read {
        message: format!("Error reading first message: {e}"),
        location: ErrorLocation::from(Location::caller()),
    })?;

    let Message::Text(text) = first else {
        warn!("Client {} sent non-text first message", addr);
        return Ok(false);
    };

    let token = match serde_json::from_str::<IpcClientMessage>(text.as_str()) {
        Ok(IpcClientMessage {
            payload: ClientPayload::AuthHandshake { token },
            ..
        }) => token,
        Ok(_) => {
            warn!(
                "Client {} auth failed: first message was not auth handshake",
                addr
            );
            return Ok(false);
        }
        Err(e) => {
            warn!("Client {} sent an undecodable first message: {}", addr, e);
            return Ok(false);
        }
    };

    if state.validate_token(&token) {
        info!("Client {} authenticated successfully", addr);
        send_frame(
            write,
            &IpcServerMessage::reply(
                AUTH_REQUEST_ID,
                ServerPayload::AuthHandshakeResponse {
                    success: true,
                    error: None,
                },
            ),
        )
        .await?;
    } else {
        warn!("Client {} auth failed: invalid token", addr);
        send_frame(
            write,
            &IpcServerMessage::reply(
                AUTH_REQUEST_ID,
                ServerPayload::AuthHandshakeResponse {
                    success: false,
                    error: Some("Invalid authentication token".to_string()),
                },
            ),
        )
        .await?;
    }

    Ok(state.is_authenticated())
}

/// Main loop for an authenticated connection.
async fn read_requests(
    read: &mut WsSource,
    console: &ConsoleHandle,
    outbound: &Outbound,
    addr: SocketAddr,
) -> Result<(), IpcError> {
    while let Some(frame) = read.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                let reply = match serde_json::from_str::<IpcClientMessage>(text.as_str()) {
                    Ok(message) => {
                        handle_message(message.payload, message.request_id, console).await
                    }
                    Err(e) => {
                        warn!("Invalid message from {}: {}", addr, e);
                        IpcServerMessage::error(
                            0,
                            IpcErrorCode::InvalidMessage,
                            format!("Invalid message: {e}"),
                        )
                    }
                };

                if outbound.send(reply).is_err() {
                    break;
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => debug!("Ignoring non-text frame from {}", addr),
            Err(e) => {
                return Err(IpcError::Read {
                    message: format!("Error reading message: {e}"),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        }
    }

    info!("Client {} disconnected", addr);
    Ok(())
}

/// Route one request to the console and build the reply.
async fn handle_message(
    payload: ClientPayload,
    request_id: u64,
    console: &ConsoleHandle,
) -> IpcServerMessage {
    let result = match payload {
        ClientPayload::AuthHandshake { .. } => {
            return IpcServerMessage::error(
                request_id,
                IpcErrorCode::AuthError,
                "Auth handshake already completed",
            );
        }
        ClientPayload::Connect { url, headers } => {
            console
                .connect(&url, headers)
                .await
                .map(|url| ServerPayload::Ack {
                    result: Some(json!({ "url": url.as_str() })),
                })
        }
        ClientPayload::SendMessage { text } => {
            console
                .send_message(&text)
                .await
                .map(|entry| ServerPayload::Ack {
                    result: serde_json::to_value(&entry).ok(),
                })
        }
        ClientPayload::GetDisplaySource { display_id } => {
            let source = console.get_display_source(&display_id).await;
            source.map(|source| ServerPayload::DisplaySource {
                display_id,
                source: source.map(|s| s.to_json()),
            })
        }
        ClientPayload::ClearAll => console
            .clear_all()
            .await
            .map(|_| ServerPayload::Ack { result: None }),
        ClientPayload::Inbound { event } => console
            .deliver(event)
            .await
            .map(|_| ServerPayload::Ack { result: None }),
    };

    match result {
        Ok(payload) => IpcServerMessage::reply(request_id, payload),
        Err(e) if e.is_rejection() => {
            info!("Request {} rejected: {}", request_id, e);
            IpcServerMessage::error(request_id, IpcErrorCode::Rejected, e.user_message())
        }
        Err(e) => {
            error!("Request {} failed: {}", request_id, e);
            IpcServerMessage::error(request_id, IpcErrorCode::InternalError, e.to_string())
        }
    }
}

/// Relay a broadcast stream to one client until either side goes away.
async fn forward<T: Clone>(
    mut source: broadcast::Receiver<T>,
    outbound: Outbound,
    to_payload: impl Fn(T) -> ServerPayload,
) {
    loop {
        match source.recv().await {
            Ok(item) => {
                if outbound
                    .send(IpcServerMessage::push(to_payload(item)))
                    .is_err()
                {
                    break;
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!("IPC client fell behind, {} pushed frames dropped", skipped);
            }
            Err(RecvError::Closed) => break,
        }
    }
}

async fn write_frames(
    mut write: WsSink,
    mut outbound: mpsc::UnboundedReceiver<IpcServerMessage>,
) -> Result<(), IpcError> {
    while let Some(message) = outbound.recv().await {
        send_frame(&mut write, &message).await?;
    }
    // The peer may already be gone.
    let _ = write.close().await;
    Ok(())
}

async fn send_frame(write: &mut WsSink, message: &IpcServerMessage) -> Result<(), IpcError> {
    let json = serde_json::to_string(message)?;

    write
        .send(Message::text(json))
        .await
        .map_err(|e| IpcError::Send {
            message: format!("Failed to send frame: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })
}
