//! Per-connection authentication state.

use common::RedactedValue;

/// Tracks whether a connection has presented the expected token.
pub(crate) struct ConnectionState {
    authenticated: bool,
    expected_token: RedactedValue,
}

impl ConnectionState {
    pub(crate) fn new(token: RedactedValue) -> Self {
        Self {
            authenticated: false,
            expected_token: token,
        }
    }

    /// Mark the connection authenticated if `token` matches.
    pub(crate) fn validate_token(&mut self, token: &str) -> bool {
        self.authenticated = !token.is_empty() && token == self.expected_token.expose();
        self.authenticated
    }

    pub(crate) fn is_authenticated(&self) -> bool {
        self.authenticated
    }
}
