// Unit tests for URL normalization and the session state machine

use crate::error::session::SessionError;
use crate::session::{SessionTracker, Transition, normalize_agent_url};

use models::SessionState;

/// **VALUE**: Verifies scheme-less input defaults to http.
///
/// **WHY THIS MATTERS**: Users type `example.com` into the connect box.
///
/// **BUG THIS CATCHES**: Would catch `url` parsing `example.com` as a relative URL error,
/// or defaulting to https.
#[test]
fn given_host_without_scheme_when_normalized_then_http_is_assumed() {
    let url = normalize_agent_url("example.com").unwrap();

    assert_eq!(url.scheme(), "http");
    assert_eq!(url.host_str(), Some("example.com"));
    assert_eq!(url.as_str(), "http://example.com/");
}

#[test]
fn given_explicit_scheme_and_port_when_normalized_then_kept() {
    let url = normalize_agent_url("  https://agent.local:8443/a2a ").unwrap();

    assert_eq!(url.as_str(), "https://agent.local:8443/a2a");
}

/// **VALUE**: Verifies malformed or non-http input is rejected.
///
/// **BUG THIS CATCHES**: Would catch accepting `ftp://` or text with spaces as a host.
#[test]
fn given_invalid_input_when_normalized_then_invalid_url_error() {
    for input in ["not a url", "", "   ", "ftp://files.example.com", "http://"] {
        let result = normalize_agent_url(input);
        assert!(
            matches!(result, Err(SessionError::InvalidUrl { .. })),
            "{input:?} should be rejected, got {result:?}"
        );
    }
}

/// **VALUE**: Verifies an invalid connect request leaves the tracker untouched.
///
/// **WHY THIS MATTERS**: Input validation errors must not mutate session state.
#[test]
fn given_invalid_url_when_connect_requested_then_state_and_generation_unchanged() {
    let mut tracker = SessionTracker::new();

    let result = tracker.request_connect("not a url");

    assert!(result.is_err());
    assert_eq!(tracker.state(), SessionState::Idle);
    assert_eq!(tracker.generation(), 0);
    assert!(tracker.agent_url().is_none());
}

/// **VALUE**: Verifies the happy path from idle to ready.
#[test]
fn given_idle_when_full_lifecycle_then_reaches_ready_and_allows_input() {
    let mut tracker = SessionTracker::new();
    assert!(!tracker.can_send());

    let (_, transition) = tracker.request_connect("example.com").unwrap();
    assert_eq!(
        transition,
        Transition {
            from: SessionState::Idle,
            to: SessionState::FetchingCard
        }
    );
    assert!(!tracker.can_send());

    assert!(tracker.card_resolved().is_some());
    assert_eq!(tracker.state(), SessionState::AwaitingInitialization);
    assert!(tracker.ensure_ready().is_err());

    assert!(tracker.initialization_acknowledged(true).is_some());
    assert_eq!(tracker.state(), SessionState::Ready);
    assert!(tracker.can_send());
    assert!(tracker.ensure_ready().is_ok());
}

/// **VALUE**: Verifies card and initialization failures both land in `error`.
#[test]
fn given_failures_when_reported_then_state_is_error() {
    let mut card_fails = SessionTracker::new();
    card_fails.request_connect("example.com").unwrap();
    assert!(card_fails.card_failed().is_some());
    assert_eq!(card_fails.state(), SessionState::Error);

    let mut init_fails = SessionTracker::new();
    init_fails.request_connect("example.com").unwrap();
    init_fails.card_resolved();
    assert!(init_fails.initialization_acknowledged(false).is_some());
    assert_eq!(init_fails.state(), SessionState::Error);
    assert!(matches!(
        init_fails.ensure_ready(),
        Err(SessionError::NotReady {
            state: SessionState::Error,
            ..
        })
    ));
}

/// **VALUE**: Verifies a timeout fails the current attempt and a late ack is ignored.
///
/// **WHY THIS MATTERS**: After a timeout the user has been told the connection failed;
/// a straggling success must not silently enable input.
///
/// **BUG THIS CATCHES**: Would catch acks being accepted from any state.
#[test]
fn given_timeout_when_late_ack_arrives_then_state_stays_error() {
    let mut tracker = SessionTracker::new();
    tracker.request_connect("example.com").unwrap();
    tracker.card_resolved();

    assert!(tracker.initialization_timed_out(tracker.generation()).is_some());
    assert_eq!(tracker.state(), SessionState::Error);

    assert_eq!(tracker.initialization_acknowledged(true), None);
    assert_eq!(tracker.state(), SessionState::Error);
    assert!(!tracker.can_send());
}

/// **VALUE**: Verifies a timer from an earlier attempt cannot fail the current one.
///
/// **BUG THIS CATCHES**: Would catch timers not being tied to a generation, so a
/// reconnect shortly after a slow attempt fails spuriously.
#[test]
fn given_reconnect_when_stale_timer_fires_then_ignored() {
    let mut tracker = SessionTracker::new();
    tracker.request_connect("first.example").unwrap();
    tracker.card_resolved();
    let stale = tracker.generation();

    tracker.request_connect("second.example").unwrap();
    tracker.card_resolved();

    assert_eq!(tracker.initialization_timed_out(stale), None);
    assert_eq!(tracker.state(), SessionState::AwaitingInitialization);
    assert_eq!(tracker.agent_url().unwrap().host_str(), Some("second.example"));
}

/// **VALUE**: Verifies connect restarts the lifecycle from any state.
#[test]
fn given_ready_when_connect_requested_then_restarts_at_fetching_card() {
    let mut tracker = SessionTracker::new();
    tracker.request_connect("example.com").unwrap();
    tracker.card_resolved();
    tracker.initialization_acknowledged(true);

    let (_, transition) = tracker.request_connect("other.example").unwrap();

    assert_eq!(transition.from, SessionState::Ready);
    assert_eq!(transition.to, SessionState::FetchingCard);
    assert_eq!(tracker.generation(), 2);
    assert!(!tracker.can_send());
}

/// **VALUE**: Verifies out-of-order bridge reports are ignored.
#[test]
fn given_idle_when_card_or_ack_reported_then_nothing_happens() {
    let mut tracker = SessionTracker::new();

    assert_eq!(tracker.card_resolved(), None);
    assert_eq!(tracker.card_failed(), None);
    assert_eq!(tracker.initialization_acknowledged(true), None);
    assert_eq!(tracker.state(), SessionState::Idle);
}
