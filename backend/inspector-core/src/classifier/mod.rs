//! Maps protocol events to render intents.
//!
//! [`classify`] is pure: it never touches console state and never fails.
//! Context id propagation and display id assignment happen in the console
//! after classification.

mod mime;

pub use mime::sanitize_mime_type;

use models::{DisplayContent, DisplayRole, EventBody, Part, ProtocolEvent, RenderIntent};

use serde_json::to_string_pretty;

const ERROR_LINE_PREFIX: &str = "[error] Error: ";
const TASK_STATUS_PREFIX: &str = "Task created with status: ";
const UNKNOWN_STATE: &str = "unknown";

/// Outcome of classifying one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Nothing to draw (no payload, empty text, unknown kind).
    NoRender,
    /// One or more lines; each becomes its own display entry.
    Render(Vec<RenderIntent>),
}

impl Classification {
    pub fn intents(&self) -> &[RenderIntent] {
        match self {
            Classification::NoRender => &[],
            Classification::Render(intents) => intents,
        }
    }

    pub fn into_intents(self) -> Vec<RenderIntent> {
        match self {
            Classification::NoRender => Vec::new(),
            Classification::Render(intents) => intents,
        }
    }
}

/// Decide what, if anything, an event renders as.
///
/// A non-empty `error` always wins and yields exactly one error line,
/// whatever the kind. Otherwise the kind decides; kinds this console does
/// not know render nothing.
pub fn classify(event: &ProtocolEvent) -> Classification {
    let kind_label = event.kind().map(str::to_string);
    let intent = |role: DisplayRole, content: DisplayContent| RenderIntent {
        role,
        kind_label: kind_label.clone(),
        content,
        validation_errors: event.validation_errors.clone(),
    };

    if let Some(error) = event.error.as_deref().filter(|e| !e.is_empty()) {
        return Classification::Render(vec![intent(
            DisplayRole::AgentError,
            DisplayContent::Plain {
                text: format!("{ERROR_LINE_PREFIX}{error}"),
            },
        )]);
    }

    let intents: Vec<RenderIntent> = match &event.body {
        EventBody::Task { status } => status
            .iter()
            .map(|status| {
                let state = if status.state.is_empty() {
                    UNKNOWN_STATE
                } else {
                    status.state.as_str()
                };
                intent(
                    DisplayRole::AgentProgress,
                    DisplayContent::Plain {
                        text: format!("{TASK_STATUS_PREFIX}{state}"),
                    },
                )
            })
            .collect(),

        EventBody::StatusUpdate { status } => status
            .as_ref()
            .and_then(|status| status.message.as_ref())
            .and_then(|message| message.first_text())
            .map(|text| {
                intent(
                    DisplayRole::AgentProgress,
                    DisplayContent::Formatted {
                        text: text.to_string(),
                    },
                )
            })
            .into_iter()
            .collect(),

        EventBody::ArtifactUpdate { artifact } => artifact
            .iter()
            .flat_map(|artifact| artifact.parts.iter())
            .filter_map(render_part)
            .map(|content| intent(DisplayRole::Agent, content))
            .collect(),

        EventBody::Message { parts } => parts
            .iter()
            .find_map(Part::non_empty_text)
            .map(|text| {
                intent(
                    DisplayRole::Agent,
                    DisplayContent::Formatted {
                        text: text.to_string(),
                    },
                )
            })
            .into_iter()
            .collect(),

        EventBody::Unknown { .. } => Vec::new(),
    };

    if intents.is_empty() {
        Classification::NoRender
    } else {
        Classification::Render(intents)
    }
}

/// One artifact part to at most one line.
fn render_part(part: &Part) -> Option<DisplayContent> {
    match part {
        Part::Text { text } if !text.is_empty() => Some(DisplayContent::Formatted {
            text: text.clone(),
        }),
        Part::Text { .. } => None,
        Part::File { file } => Some(DisplayContent::FileLink {
            mime_type: sanitize_mime_type(file.mime_type.as_deref()),
            uri: file.uri.clone(),
        }),
        Part::Data { data } => Some(DisplayContent::DataDump {
            pretty: to_string_pretty(data).unwrap_or_else(|_| data.to_string()),
        }),
        Part::Unsupported { .. } => None,
    }
}
