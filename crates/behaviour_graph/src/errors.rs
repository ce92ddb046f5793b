use thiserror::Error;

use crate::PropertyKind;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Duplicate identity: {0} is already present")]
    DuplicateIdentity(String),

    #[error("Dangling reference: {0}")]
    DanglingReference(String),

    #[error("Type mismatch on '{name}': expected {expected}, found {found}")]
    TypeMismatch {
        name: String,
        expected: PropertyKind,
        found: String,
    },

    #[error("Invalid action state: {0}")]
    InvalidState(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GraphError {
    pub fn invalid(message: impl Into<String>) -> Self {
        GraphError::InvalidArgument(message.into())
    }

    pub fn dangling(message: impl Into<String>) -> Self {
        GraphError::DanglingReference(message.into())
    }

    pub fn mismatch(name: &str, expected: PropertyKind, found: impl ToString) -> Self {
        GraphError::TypeMismatch {
            name: name.to_string(),
            expected,
            found: found.to_string(),
        }
    }
}

/// Reject NaN and infinities, which cannot be written to a document.
pub(crate) fn check_finite(what: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(GraphError::invalid(format!("{} must be a finite number, got {}", what, value)))
    }
}

pub type Result<T> = std::result::Result<T, GraphError>;
