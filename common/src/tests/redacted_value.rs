use crate::RedactedValue;

/// **VALUE**: Verifies header secrets never leak through `Debug` or `Display`.
///
/// **WHY THIS MATTERS**: Connect requests are logged at info level with their headers.
/// A bearer token in the log file would be a credential leak.
///
/// **BUG THIS CATCHES**: Would catch a derived `Debug` replacing the manual impl.
#[test]
fn given_secret_when_formatted_then_value_is_hidden() {
    let secret = RedactedValue::new("Bearer super-secret");

    let debug = format!("{secret:?}");
    let display = format!("{secret}");

    assert!(!debug.contains("super-secret"));
    assert!(!display.contains("super-secret"));
    assert_eq!(secret.expose(), "Bearer super-secret");
}

/// **VALUE**: Verifies the value can come in over the wire but cannot go out implicitly.
///
/// **BUG THIS CATCHES**: Would catch someone deriving `Serialize`, which would let a
/// `serde_json::to_string(&config)` dump secrets.
#[test]
fn given_json_string_when_round_tripped_then_deserializes_but_refuses_serialize() {
    let secret: RedactedValue = serde_json::from_str("\"token-123\"").unwrap();
    assert_eq!(secret.expose(), "token-123");

    let result = serde_json::to_string(&secret);
    assert!(result.is_err(), "Serialization must be refused");
}
