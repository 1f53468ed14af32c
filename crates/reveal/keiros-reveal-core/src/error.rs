//! Error types for the reveal core.
//!
//! Every failure here is non-fatal for the page: a registration that errors is
//! skipped and logged, and the rest of the page keeps animating.

use serde::{Deserialize, Serialize};

use crate::ids::ElementId;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum RevealError {
    /// A selector matched no node.
    #[error("no element matches selector '{selector}'")]
    MissingElement { selector: String },

    /// The element already carries an action and the reject policy is active.
    #[error("element {element} is already registered")]
    DuplicateRegistration { element: ElementId },

    #[error("invalid counter: {reason}")]
    InvalidCounter { reason: String },

    #[error("threshold {value} is outside [0, 1]")]
    InvalidThreshold { value: f64 },

    #[error("invalid root margin '{input}'")]
    InvalidMargin { input: String },

    /// A data attribute the action depends on is missing or unparsable.
    #[error("element {element} has no usable '{name}' attribute")]
    InvalidAttribute { element: ElementId, name: String },

    #[error("element {element} is not registered")]
    UnknownElement { element: ElementId },

    #[error(transparent)]
    Contact(#[from] ContactError),
}

/// Validation failures of the contact form handoff.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContactError {
    #[error("required field '{field}' is empty")]
    MissingField { field: String },

    #[error("'{email}' is not a valid email address")]
    InvalidEmail { email: String },
}

impl RevealError {
    /// Registration errors only cost the affected element its animation.
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::MissingElement { .. }
                | Self::DuplicateRegistration { .. }
                | Self::InvalidAttribute { .. }
                | Self::UnknownElement { .. }
                | Self::Contact(_)
        )
    }

    /// Error category for log lines.
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::MissingElement { .. } | Self::UnknownElement { .. } => "lookup",
            Self::DuplicateRegistration { .. } => "registry",
            Self::InvalidCounter { .. }
            | Self::InvalidThreshold { .. }
            | Self::InvalidMargin { .. }
            | Self::InvalidAttribute { .. } => "validation",
            Self::Contact(_) => "contact",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offender() {
        let err = RevealError::MissingElement {
            selector: ".chart-bar".into(),
        };
        assert_eq!(err.to_string(), "no element matches selector '.chart-bar'");

        let err = RevealError::DuplicateRegistration {
            element: ElementId(3),
        };
        assert_eq!(err.to_string(), "element #3 is already registered");
    }

    #[test]
    fn recoverability_and_categories() {
        let missing = RevealError::MissingElement {
            selector: ".x".into(),
        };
        assert!(missing.is_recoverable());
        assert_eq!(missing.category(), "lookup");

        let bad = RevealError::InvalidThreshold { value: 1.5 };
        assert!(!bad.is_recoverable());
        assert_eq!(bad.category(), "validation");

        let contact: RevealError = ContactError::MissingField {
            field: "name".into(),
        }
        .into();
        assert_eq!(contact.category(), "contact");
        assert_eq!(contact.to_string(), "required field 'name' is empty");
    }

    #[test]
    fn serializes_as_json() {
        let err = RevealError::InvalidCounter {
            reason: "duration_ms must be > 0".into(),
        };
        let text = serde_json::to_string(&err).unwrap();
        let back: RevealError = serde_json::from_str(&text).unwrap();
        assert_eq!(err, back);
    }
}
