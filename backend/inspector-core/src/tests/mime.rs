use crate::classifier::sanitize_mime_type;

/// **VALUE**: Verifies well-formed types are normalized and parameters dropped.
#[test]
fn given_valid_mime_when_sanitized_then_lowercase_essence() {
    assert_eq!(sanitize_mime_type(Some("image/png")), "image/png");
    assert_eq!(
        sanitize_mime_type(Some("Text/Plain; charset=utf-8")),
        "text/plain"
    );
    assert_eq!(
        sanitize_mime_type(Some("application/vnd.api+json")),
        "application/vnd.api+json"
    );
}

/// **VALUE**: Verifies anything that is not a bare token pair is labeled `unknown`.
///
/// **WHY THIS MATTERS**: The label is shown next to an agent-controlled link; markup
/// or script in it must never reach the UI.
///
/// **BUG THIS CATCHES**: Would catch an unanchored regex accepting a valid prefix.
#[test]
fn given_hostile_or_missing_mime_when_sanitized_then_unknown() {
    assert_eq!(sanitize_mime_type(None), "unknown");
    assert_eq!(sanitize_mime_type(Some("")), "unknown");
    assert_eq!(sanitize_mime_type(Some("image")), "unknown");
    assert_eq!(
        sanitize_mime_type(Some("text/html<script>alert(1)</script>")),
        "unknown"
    );
    assert_eq!(sanitize_mime_type(Some("a/b/c")), "unknown");
}
