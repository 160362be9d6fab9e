//! Connection lifecycle state machine.
//!
//! ```text
//! idle -> fetching-card -> awaiting-initialization -> ready
//!              |                    |
//!              +------> error <-----+
//! ```
//!
//! A connect request from any state starts over at `fetching-card` with a
//! new generation number. The initialization timer carries the generation
//! it was started for, so a timer from an earlier attempt can never fail
//! the current one.
//!
//! The tracker is plain data; the console drives it and owns the timer.

use crate::error::session::SessionError;

use models::SessionState;

use std::sync::OnceLock;
use std::time::Duration;

use log::{debug, info};
use regex::Regex;
use url::Url;

/// How long to wait for the initialization acknowledgment.
pub const DEFAULT_INITIALIZATION_TIMEOUT: Duration = Duration::from_millis(10_000);

const DEFAULT_SCHEME_PREFIX: &str = "http://";
const SCHEME_PATTERN: &str = r"^[A-Za-z][A-Za-z0-9+.\-]*://";
const ALLOWED_SCHEMES: [&str; 2] = ["http", "https"];

static SCHEME_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_scheme_regex() -> &'static Regex {
    SCHEME_REGEX.get_or_init(|| Regex::new(SCHEME_PATTERN).expect("valid regex pattern"))
}

/// A state change, reported so the console can publish it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: SessionState,
    pub to: SessionState,
}

/// Parse user input into an agent URL.
///
/// Input without a scheme gets `http://`. Only http and https URLs with a
/// host are accepted.
#[track_caller]
pub fn normalize_agent_url(input: &str) -> Result<Url, SessionError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(SessionError::invalid_url(input, "URL is empty"));
    }

    let candidate = if get_scheme_regex().is_match(trimmed) {
        trimmed.to_string()
    } else {
        format!("{DEFAULT_SCHEME_PREFIX}{trimmed}")
    };

    let url = Url::parse(&candidate).map_err(|e| SessionError::invalid_url(input, e.to_string()))?;

    if !ALLOWED_SCHEMES.contains(&url.scheme()) {
        return Err(SessionError::invalid_url(
            input,
            format!("unsupported scheme '{}', expected http or https", url.scheme()),
        ));
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(SessionError::invalid_url(input, "URL has no host"));
    }

    Ok(url)
}

/// Session lifecycle for the one agent connection.
#[derive(Debug, Default)]
pub struct SessionTracker {
    state: SessionState,
    generation: u64,
    agent_url: Option<Url>,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Incremented by every accepted connect request.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn agent_url(&self) -> Option<&Url> {
        self.agent_url.as_ref()
    }

    pub fn can_send(&self) -> bool {
        self.state.accepts_input()
    }

    /// Reject outbound messages unless the session is ready.
    #[track_caller]
    pub fn ensure_ready(&self) -> Result<(), SessionError> {
        if self.can_send() {
            Ok(())
        } else {
            Err(SessionError::not_ready(self.state))
        }
    }

    /// Start (or restart) the lifecycle for `input`.
    ///
    /// Invalid input leaves the tracker untouched.
    #[track_caller]
    pub fn request_connect(&mut self, input: &str) -> Result<(Url, Transition), SessionError> {
        let url = normalize_agent_url(input)?;

        self.generation += 1;
        self.agent_url = Some(url.clone());
        let transition = self.move_to(SessionState::FetchingCard);

        info!(
            "Connect requested for {url} (attempt {})",
            self.generation
        );
        Ok((url, transition))
    }

    pub fn card_resolved(&mut self) -> Option<Transition> {
        self.advance_from(
            SessionState::FetchingCard,
            SessionState::AwaitingInitialization,
        )
    }

    pub fn card_failed(&mut self) -> Option<Transition> {
        self.advance_from(SessionState::FetchingCard, SessionState::Error)
    }

    /// Success or failure reply to the initialization request.
    ///
    /// Ignored unless an initialization is actually pending, which is what
    /// makes a late acknowledgment after a timeout harmless.
    pub fn initialization_acknowledged(&mut self, success: bool) -> Option<Transition> {
        let target = if success {
            SessionState::Ready
        } else {
            SessionState::Error
        };
        self.advance_from(SessionState::AwaitingInitialization, target)
    }

    /// Timer expiry for the attempt numbered `generation`.
    pub fn initialization_timed_out(&mut self, generation: u64) -> Option<Transition> {
        if generation != self.generation {
            debug!(
                "Ignoring stale initialization timer (attempt {generation}, current {})",
                self.generation
            );
            return None;
        }
        self.advance_from(SessionState::AwaitingInitialization, SessionState::Error)
    }

    fn advance_from(&mut self, expected: SessionState, to: SessionState) -> Option<Transition> {
        if self.state != expected {
            debug!(
                "Ignoring {expected} -> {to}: session is {}",
                self.state
            );
            return None;
        }
        Some(self.move_to(to))
    }

    fn move_to(&mut self, to: SessionState) -> Transition {
        let transition = Transition {
            from: self.state,
            to,
        };
        self.state = to;
        debug!("Session {} -> {}", transition.from, transition.to);
        transition
    }
}
