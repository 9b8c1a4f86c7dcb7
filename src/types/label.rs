// ABOUTME: Validated free-text labels for deployment names and versions.
// ABOUTME: Rejects blank input so every persisted row is identifiable.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Maximum label length in characters.
pub const MAX_LABEL_LEN: usize = 255;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LabelError {
    #[error("{field} is required")]
    Empty { field: &'static str },

    #[error("{field} exceeds maximum length of {MAX_LABEL_LEN} characters")]
    TooLong { field: &'static str },

    #[error("{field} contains a control character")]
    ControlChar { field: &'static str },
}

impl LabelError {
    /// Name of the offending input field.
    pub fn field(&self) -> &'static str {
        match self {
            LabelError::Empty { field }
            | LabelError::TooLong { field }
            | LabelError::ControlChar { field } => field,
        }
    }
}

/// A trimmed, non-empty label such as a deployment name or version.
///
/// Deserializing re-validates the value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Label(String);

impl Label {
    /// Validate `value` as the input named `field`.
    pub fn new(field: &'static str, value: &str) -> Result<Self, LabelError> {
        let trimmed = value.trim();

        if trimmed.is_empty() {
            return Err(LabelError::Empty { field });
        }

        if trimmed.chars().count() > MAX_LABEL_LEN {
            return Err(LabelError::TooLong { field });
        }

        if trimmed.chars().any(char::is_control) {
            return Err(LabelError::ControlChar { field });
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Label {
    type Error = LabelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Label::new("label", &value)
    }
}

impl From<Label> for String {
    fn from(label: Label) -> Self {
        label.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_surrounding_whitespace() {
        let label = Label::new("name", "  api  ").unwrap();
        assert_eq!(label.as_str(), "api");
    }

    #[test]
    fn blank_is_empty() {
        assert_eq!(
            Label::new("version", "   "),
            Err(LabelError::Empty { field: "version" })
        );
    }

    #[test]
    fn rejects_overlong_input() {
        let long = "a".repeat(MAX_LABEL_LEN + 1);
        assert_eq!(Label::new("name", &long).unwrap_err().field(), "name");
    }

    #[test]
    fn rejects_newlines_inside() {
        assert!(matches!(
            Label::new("name", "api\nv2"),
            Err(LabelError::ControlChar { .. })
        ));
    }
}
