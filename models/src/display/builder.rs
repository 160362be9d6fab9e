use crate::display::{DISPLAY_ID_PREFIX, DisplayContent, DisplayEntry, DisplayRole, RenderIntent};
use crate::error::model_error::ModelError;

/// Builder for validated [`DisplayEntry`] instances.
///
/// The validity flag is never set directly; it is derived from the
/// validation errors at build time.
#[derive(Debug, Default)]
pub struct DisplayEntryBuilder {
    display_id: Option<String>,
    role: Option<DisplayRole>,
    kind_label: Option<String>,
    content: Option<DisplayContent>,
    validation_errors: Vec<String>,
}

impl DisplayEntryBuilder {
    /// Start from a classifier intent; only the display id is left to set.
    pub fn from_intent(intent: RenderIntent) -> Self {
        Self {
            display_id: None,
            role: Some(intent.role),
            kind_label: intent.kind_label,
            content: Some(intent.content),
            validation_errors: intent.validation_errors,
        }
    }

    pub fn with_display_id(mut self, display_id: impl Into<String>) -> Self {
        self.display_id = Some(display_id.into());
        self
    }

    pub fn with_role(mut self, role: DisplayRole) -> Self {
        self.role = Some(role);
        self
    }

    pub fn with_kind_label(mut self, label: impl Into<String>) -> Self {
        self.kind_label = Some(label.into());
        self
    }

    pub fn with_content(mut self, content: DisplayContent) -> Self {
        self.content = Some(content);
        self
    }

    pub fn with_validation_errors(mut self, errors: Vec<String>) -> Self {
        self.validation_errors = errors;
        self
    }

    #[track_caller]
    pub fn build(self) -> Result<DisplayEntry, ModelError> {
        let display_id = self
            .display_id
            .ok_or_else(|| ModelError::missing("display_id"))?;

        if !display_id.starts_with(DISPLAY_ID_PREFIX) || display_id.len() == DISPLAY_ID_PREFIX.len()
        {
            return Err(ModelError::invalid_display_id(display_id, DISPLAY_ID_PREFIX));
        }

        let role = self.role.ok_or_else(|| ModelError::missing("role"))?;
        let content = self.content.ok_or_else(|| ModelError::missing("content"))?;

        let valid = self.validation_errors.is_empty();

        Ok(DisplayEntry {
            display_id,
            role,
            kind_label: self.kind_label,
            content,
            validation_errors: self.validation_errors,
            valid,
        })
    }
}
