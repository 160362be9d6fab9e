//! IPC server handle type.

use common::RedactedValue;

use std::net::SocketAddr;

use log::info;
use tokio::task::JoinHandle;

/// Handle to a running IPC WebSocket server.
///
/// Returned by [`start_ipc_server`](crate::ipc::start_ipc_server). Dropping
/// the handle does not stop the server; call [`shutdown`](Self::shutdown).
pub struct IpcServerHandle {
    pub(crate) local_addr: SocketAddr,
    pub(crate) auth_token: RedactedValue,
    pub(crate) accept_task: JoinHandle<()>,
}

impl IpcServerHandle {
    /// Bound address; useful when the server was started on port 0.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn port(&self) -> u16 {
        self.local_addr.port()
    }

    /// Token clients must present in their first frame.
    pub fn auth_token(&self) -> &RedactedValue {
        &self.auth_token
    }

    /// Stop accepting and close every open connection.
    pub fn shutdown(self) {
        self.accept_task.abort();
        info!("IPC server on {} shut down", self.local_addr);
    }
}
