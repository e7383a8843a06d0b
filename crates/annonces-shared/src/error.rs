use thiserror::Error;

/// A text tag did not name any variant of a closed enumeration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown {kind}: {value:?}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// One or more business rules were violated.  Carries one human-readable
/// reason per rule so the caller can show them all at once.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Validation failed: {}", reasons.join("; "))]
pub struct ValidationError {
    pub reasons: Vec<String>,
}

impl ValidationError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reasons: vec![reason.into()],
        }
    }

    /// `Ok(())` when no reason was collected.
    pub fn check(reasons: Vec<String>) -> Result<(), Self> {
        if reasons.is_empty() {
            Ok(())
        } else {
            Err(Self { reasons })
        }
    }
}
