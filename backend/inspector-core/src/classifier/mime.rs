use std::sync::OnceLock;

use regex::Regex;

const MIME_TYPE_PATTERN: &str = r"^[A-Za-z0-9!#$&^_.+-]+/[A-Za-z0-9!#$&^_.+-]+$";
const UNKNOWN_MIME_TYPE: &str = "unknown";

static MIME_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_mime_regex() -> &'static Regex {
    MIME_REGEX.get_or_init(|| Regex::new(MIME_TYPE_PATTERN).expect("valid regex pattern"))
}

/// Reduce an agent-supplied MIME type to a safe `type/subtype` label.
///
/// Parameters (`; charset=...`) are dropped and the result lowercased;
/// anything that is not a bare RFC 6838 token pair becomes `unknown`.
pub fn sanitize_mime_type(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return UNKNOWN_MIME_TYPE.to_string();
    };

    let essence = raw.split(';').next().unwrap_or_default().trim();

    if get_mime_regex().is_match(essence) {
        essence.to_ascii_lowercase()
    } else {
        UNKNOWN_MIME_TYPE.to_string()
    }
}
