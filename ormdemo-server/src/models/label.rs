//! Short display names (companies, shops)

use super::ValidationError;

const MAX_LABEL_LEN: usize = 128;

/// Validated, trimmed, non-empty display name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label(String);

impl Label {
    /// `field` names the input in validation messages.
    pub fn new(field: &'static str, s: &str) -> Result<Self, ValidationError> {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field });
        }

        if trimmed.chars().count() > MAX_LABEL_LEN {
            return Err(ValidationError::TooLong {
                field,
                max: MAX_LABEL_LEN,
            });
        }

        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
