pub mod config;
pub mod console;
pub mod ipc;
pub mod session;
