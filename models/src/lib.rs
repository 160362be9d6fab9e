//! Domain models for the A2A inspector console.
//!
//! This crate contains pure data structures: the protocol events an agent
//! streams back, the debug log fragments the transport bridge reports, the
//! session lifecycle states and the rendered display entries. Models carry
//! no console logic - they're just data passed between layers.
//!
//! ## Architecture
//!
//! - **models** (this crate): Pure data structures
//! - **inspector-core**: Console logic operating on models
//! - **a2a-inspector**: Application wiring everything together

pub mod debug_log;
pub mod display;
pub mod error;
pub mod protocol;
pub mod session_state;

pub use common::ErrorLocation;
pub use debug_log::{DebugLogEntry, LogChannel};
pub use display::builder::DisplayEntryBuilder;
pub use display::{DisplayContent, DisplayEntry, DisplayRole, RenderIntent};
pub use error::model_error::ModelError;
pub use protocol::part::{FileRef, Part};
pub use protocol::{Artifact, EventBody, ProtocolEvent, StatusMessage, TaskStatus};
pub use session_state::SessionState;

#[cfg(test)]
mod tests;
