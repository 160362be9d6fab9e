//! Console behavior through the public actor handle.

use inspector_core::config::ConsoleConfig;
use inspector_core::console::{ConsoleHandle, ConsoleUpdate, InboundEvent};
use inspector_core::correlation::ResolvedSource;
use inspector_core::error::console::ConsoleError;
use inspector_core::transport::{ChannelTransport, TransportCommand};
use inspector_core::validators::decode_agent_response;

use models::SessionState;

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tokio::sync::broadcast;
use tokio::time::Instant;

fn agent_card() -> Value {
    json!({
        "name": "Echo",
        "description": "Echoes input.",
        "url": "http://example.com/",
        "version": "1.0.0",
        "capabilities": { "streaming": true },
        "defaultInputModes": ["text/plain"],
        "defaultOutputModes": ["text/plain"],
        "skills": [{ "id": "echo" }]
    })
}

fn spawn_console() -> (ConsoleHandle, broadcast::Receiver<TransportCommand>) {
    let transport = ChannelTransport::new();
    let commands = transport.subscribe();
    let console = ConsoleHandle::spawn(&ConsoleConfig::default(), Arc::new(transport));
    (console, commands)
}

async fn make_ready(console: &ConsoleHandle) {
    console.connect("example.com", Vec::new()).await.unwrap();
    console
        .deliver(InboundEvent::CardResolved {
            card: agent_card(),
        })
        .await
        .unwrap();
    console
        .deliver(InboundEvent::InitializationAck {
            success: true,
            error: None,
        })
        .await
        .unwrap();
    assert_eq!(console.state(), SessionState::Ready);
}

/// **VALUE**: Verifies the initialization bound: no ack for 10 000 ms means `error`, and a
/// late ack is ignored.
///
/// **WHY THIS MATTERS**: Without the bound a silent bridge leaves the UI spinning forever;
/// accepting the late ack would enable input after the user was told it failed.
///
/// **BUG THIS CATCHES**: Would catch the timer not being started on card resolution,
/// firing early, or the tracker accepting acks outside `awaiting-initialization`.
#[tokio::test(start_paused = true)]
async fn given_no_ack_when_timeout_elapses_then_error_and_late_ack_ignored() {
    // GIVEN: A console waiting for initialization
    let (console, mut commands) = spawn_console();
    let mut state = console.subscribe_state();
    console.connect("example.com", Vec::new()).await.unwrap();
    console
        .deliver(InboundEvent::CardResolved {
            card: agent_card(),
        })
        .await
        .unwrap();
    let started = Instant::now();
    assert_eq!(console.state(), SessionState::AwaitingInitialization);

    // WHEN: Just under the bound passes
    tokio::time::advance(Duration::from_millis(9_999)).await;
    tokio::task::yield_now().await;

    // THEN: Still waiting
    assert_eq!(console.state(), SessionState::AwaitingInitialization);

    // WHEN: The bound is reached
    tokio::time::advance(Duration::from_millis(1)).await;
    state
        .wait_for(|s| *s == SessionState::Error)
        .await
        .unwrap();

    // THEN: The attempt failed once the bound was reached
    assert!(started.elapsed() >= Duration::from_millis(10_000));

    // WHEN: The acknowledgment finally shows up
    console
        .deliver(InboundEvent::InitializationAck {
            success: true,
            error: None,
        })
        .await
        .unwrap();

    // THEN: It changes nothing and input stays disabled
    assert_eq!(console.state(), SessionState::Error);
    let sent = console.send_message("hello?").await;
    assert!(matches!(sent, Err(ref e) if e.is_rejection()));

    let mut sent_commands = Vec::new();
    while let Ok(command) = commands.try_recv() {
        sent_commands.push(command);
    }
    assert!(
        sent_commands
            .iter()
            .all(|c| !matches!(c, TransportCommand::SendMessage { .. })),
        "nothing may be sent after a timeout"
    );
}

/// **VALUE**: Verifies sending before `ready` produces no outbound command.
#[tokio::test]
async fn given_fetching_card_when_send_message_then_no_outbound_command() {
    let (console, mut commands) = spawn_console();
    console.connect("example.com", Vec::new()).await.unwrap();

    let result = console.send_message("too early").await;

    let error = result.unwrap_err();
    assert!(error.is_rejection());
    assert_eq!(
        error.user_message(),
        "Cannot send while the session is fetching-card"
    );
    assert!(matches!(
        commands.try_recv(),
        Ok(TransportCommand::Connect { .. })
    ));
    assert!(commands.try_recv().is_err());
}

/// **VALUE**: Verifies a three-part artifact shows up as three chat lines, each inspectable.
///
/// **WHY THIS MATTERS**: This is the user-visible contract of the correlation index.
///
/// **BUG THIS CATCHES**: Would catch entries published with ids the index does not know.
#[tokio::test]
async fn given_three_part_artifact_when_delivered_then_each_line_is_inspectable() {
    // GIVEN: A ready console and an update subscription
    let (console, _commands) = spawn_console();
    make_ready(&console).await;
    let mut updates = console.subscribe_updates();

    // WHEN: The bridge delivers an artifact with text, file and data parts
    console
        .deliver(InboundEvent::AgentResponse {
            event: decode_agent_response(&json!({
                "kind": "artifact-update",
                "id": "req-1",
                "contextId": "ctx-1",
                "artifact": { "parts": [
                    { "kind": "text", "text": "Done." },
                    { "kind": "file", "file": { "uri": "https://x/out.csv", "mimeType": "text/csv" } },
                    { "kind": "data", "data": { "rows": 12 } }
                ]}
            })),
        })
        .await
        .unwrap();

    // THEN: Three entries were published
    let mut display_ids = Vec::new();
    while let Ok(update) = updates.try_recv() {
        if let ConsoleUpdate::Entry { entry } = update {
            display_ids.push(entry.display_id);
        }
    }
    assert_eq!(display_ids.len(), 3);

    // THEN: Each resolves to the artifact event
    for display_id in &display_ids {
        match console.get_display_source(display_id).await.unwrap() {
            Some(ResolvedSource::Event(event)) => assert_eq!(event.id, "req-1"),
            other => panic!("{display_id} did not resolve: {other:?}"),
        }
    }

    // WHEN: The console is cleared
    console.clear_all().await.unwrap();

    // THEN: None of them resolve anymore
    for display_id in &display_ids {
        assert!(console.get_display_source(display_id).await.unwrap().is_none());
    }
}

/// **VALUE**: Verifies state changes reach watch subscribers in order.
#[tokio::test]
async fn given_subscriber_when_connecting_then_sees_every_transition() {
    let (console, _commands) = spawn_console();
    let mut updates = console.subscribe_updates();

    make_ready(&console).await;

    let mut states = Vec::new();
    while let Ok(update) = updates.try_recv() {
        if let ConsoleUpdate::SessionState { state, .. } = update {
            states.push(state);
        }
    }
    assert_eq!(
        states,
        vec![
            SessionState::FetchingCard,
            SessionState::AwaitingInitialization,
            SessionState::Ready
        ]
    );
}

/// **VALUE**: Verifies a disposed console refuses further work.
///
/// **BUG THIS CATCHES**: Would catch handles hanging forever on a stopped actor.
#[tokio::test]
async fn given_disposed_console_when_used_then_actor_gone() {
    let (console, _commands) = spawn_console();
    let other = console.clone();

    console.dispose().await.unwrap();

    let result = other.connect("example.com", Vec::new()).await;
    assert!(matches!(result, Err(ConsoleError::ActorGone { .. })));
}
