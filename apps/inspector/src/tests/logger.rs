// Unit tests for logger module initialization logic
// Tests focus on thread-safety and error handling

use crate::error::InspectorAppError;
use crate::logger::{LOG_FILE_NAME, initialize, resolve_level};

use std::path::PathBuf;

use log::LevelFilter;
use serial_test::serial;
use tempfile::TempDir;

#[test]
fn given_inspector_name_when_naming_log_file_then_uses_it() {
    assert_eq!(LOG_FILE_NAME, "a2a-inspector.log");
}

/// **VALUE**: Verifies that calling initialize() multiple times doesn't panic or fail.
///
/// **WHY THIS MATTERS**: Startup and tests may both reach the logger. If the second
/// call panics, the process dies before the console is up.
///
/// **BUG THIS CATCHES**: Would catch the install claim being dropped, which makes fern
/// fail when a second global logger is set.
#[test]
#[serial]
fn given_logger_initialized_when_called_again_then_returns_ok() {
    // GIVEN: A valid temporary directory
    let temp_dir = TempDir::new().unwrap();

    // WHEN: Calling initialize twice
    let first = initialize(temp_dir.path());
    let second = initialize(temp_dir.path());

    // THEN: The second call is a no-op whatever the first returned
    assert!(
        second.is_ok(),
        "Second initialization should succeed (idempotent)"
    );
    if first.is_ok() {
        assert!(temp_dir.path().join(LOG_FILE_NAME).exists());
    }
}

/// **VALUE**: Verifies an unwritable log directory is an error, not a panic.
///
/// **WHY THIS MATTERS**: A read-only or missing config directory must produce a clear
/// startup error.
///
/// **BUG THIS CATCHES**: Would catch `fern::log_file()` being unwrapped.
///
/// Only meaningful when no other test in this process initialized the logger first;
/// after that the guard makes every call return Ok.
#[test]
#[serial]
fn given_invalid_log_dir_when_initialize_called_then_error_or_already_initialized() {
    let invalid_dir = PathBuf::from("/dev/null/invalid-path");

    let result = initialize(&invalid_dir);

    match result {
        Ok(()) => {}
        Err(e) => assert!(
            matches!(e, InspectorAppError::Inspector { .. }),
            "Error should be InspectorAppError::Inspector, got {e:?}"
        ),
    }
}

/// **VALUE**: Verifies the level override accepts any `log` level name and falls back
/// to the build default otherwise.
///
/// **BUG THIS CATCHES**: Would catch a typo in the variable turning logging off, or a
/// blank value being parsed as an error.
#[test]
fn given_level_override_when_resolved_then_parsed_or_default() {
    assert_eq!(resolve_level(Some("trace")), LevelFilter::Trace);
    assert_eq!(resolve_level(Some(" WARN ")), LevelFilter::Warn);
    assert_eq!(resolve_level(Some("off")), LevelFilter::Off);

    let default = resolve_level(None);
    assert_eq!(resolve_level(Some("")), default);
    assert_eq!(resolve_level(Some("loud")), default);
}
