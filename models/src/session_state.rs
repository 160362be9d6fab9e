use serde::{Deserialize, Serialize};

/// Lifecycle of the single agent connection the console is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionState {
    #[default]
    Idle,
    FetchingCard,
    AwaitingInitialization,
    Ready,
    Error,
}

impl SessionState {
    /// Chat input is only enabled once the session is initialized.
    pub fn accepts_input(&self) -> bool {
        matches!(self, SessionState::Ready)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::FetchingCard => "fetching-card",
            SessionState::AwaitingInitialization => "awaiting-initialization",
            SessionState::Ready => "ready",
            SessionState::Error => "error",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
