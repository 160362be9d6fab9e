//! IPC layer between the console and its clients.
//!
//! Two kinds of client connect over the same localhost WebSocket: the UI
//! shell (connect, send, inspect, clear) and the transport bridge
//! (`inbound` events, relayed transport commands). Both authenticate with
//! the same token.

mod connection_state;
mod handle;
pub mod protocol;
mod server;

pub use handle::IpcServerHandle;
pub use protocol::{ClientPayload, IpcClientMessage, IpcErrorCode, IpcServerMessage, ServerPayload};
pub use server::start_ipc_server;
