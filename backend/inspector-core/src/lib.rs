pub mod classifier;
pub mod config;
pub mod console;
pub mod correlation;
pub mod error;
pub mod ipc;
pub mod log_store;
pub mod session;
pub mod transport;
pub mod validators;

#[cfg(test)]
mod tests;

pub const INSPECTOR_NAME: &str = "a2a-inspector";
pub const IPC_HOSTNAME: &str = "127.0.0.1";
pub const IPC_BASE_URL: &str = const_format::concatcp!("ws://", IPC_HOSTNAME);
