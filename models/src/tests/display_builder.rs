use crate::{DisplayContent, DisplayEntryBuilder, DisplayRole, ModelError, RenderIntent};

fn intent(errors: Vec<String>) -> RenderIntent {
    RenderIntent {
        role: DisplayRole::Agent,
        kind_label: Some("message".to_string()),
        content: DisplayContent::Formatted {
            text: "hi".to_string(),
        },
        validation_errors: errors,
    }
}

/// **VALUE**: Verifies the validity flag is derived from validation errors.
///
/// **WHY THIS MATTERS**: The UI shows a warning marker for invalid entries; a flag that
/// could be set independently would drift from the error list it summarizes.
///
/// **BUG THIS CATCHES**: Would catch the builder defaulting `valid` to true.
#[test]
fn given_intent_with_errors_when_built_then_entry_is_invalid() {
    let entry = DisplayEntryBuilder::from_intent(intent(vec!["missing role".to_string()]))
        .with_display_id("display-1")
        .build()
        .unwrap();

    assert!(!entry.valid);
    assert_eq!(entry.validation_errors.len(), 1);

    let clean = DisplayEntryBuilder::from_intent(intent(Vec::new()))
        .with_display_id("display-2")
        .build()
        .unwrap();
    assert!(clean.valid);
}

/// **VALUE**: Verifies display ids must be synthesized ids, never protocol ids.
///
/// **BUG THIS CATCHES**: Would catch someone passing the event id straight through,
/// which makes two lines from one artifact share an id.
#[test]
fn given_protocol_style_id_when_built_then_validation_fails() {
    let result = DisplayEntryBuilder::from_intent(intent(Vec::new()))
        .with_display_id("req-42")
        .build();

    assert!(matches!(
        result,
        Err(ModelError::InvalidDisplayId { ref display_id, .. }) if display_id == "req-42"
    ));

    let bare_prefix = DisplayEntryBuilder::from_intent(intent(Vec::new()))
        .with_display_id("display-")
        .build();
    assert!(bare_prefix.is_err());
}

#[test]
fn given_missing_content_when_built_then_reports_field() {
    let err = DisplayEntryBuilder::default()
        .with_display_id("display-3")
        .with_role(DisplayRole::User)
        .build()
        .unwrap_err();

    assert!(matches!(err, ModelError::MissingField { field: "content", .. }));
    assert!(err.to_string().contains("content is required"));
}
