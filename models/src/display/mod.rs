//! Rendered chat entries handed to the UI shell.

pub mod builder;

use serde::{Deserialize, Serialize};

/// Prefix of every synthesized display id.
pub const DISPLAY_ID_PREFIX: &str = "display-";

/// Who a chat line is attributed to, and how the UI styles it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayRole {
    User,
    Agent,
    AgentProgress,
    AgentError,
}

/// What to draw. Markdown and HTML rendering stay in the UI shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DisplayContent {
    /// Shown verbatim.
    Plain { text: String },
    /// Agent-authored text for the shell's markdown renderer.
    Formatted { text: String },
    /// A link to a file part; `mime_type` is already sanitized.
    FileLink { mime_type: String, uri: Option<String> },
    /// Pretty-printed structured data.
    DataDump { pretty: String },
}

/// A line the console wants drawn, before it has been given an identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderIntent {
    pub role: DisplayRole,
    /// Event kind shown as a chip next to the line (`task`, `message`, ...).
    pub kind_label: Option<String>,
    pub content: DisplayContent,
    pub validation_errors: Vec<String>,
}

impl RenderIntent {
    pub fn is_valid(&self) -> bool {
        self.validation_errors.is_empty()
    }
}

/// A rendered chat entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayEntry {
    pub display_id: String,
    pub role: DisplayRole,
    pub kind_label: Option<String>,
    pub content: DisplayContent,
    pub validation_errors: Vec<String>,
    pub valid: bool,
}
