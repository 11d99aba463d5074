//! Error types and results for policy loading and validation.

use std::fmt;

/// A single validation failure, located by field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Dotted path to the offending field (e.g. `caps.daily.maxUsd`).
    pub field: String,
    /// Human-readable description of the violation.
    pub message: String,
}

impl FieldError {
    /// Create a new field error.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Errors that can occur while loading or validating a policy.
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    /// The policy file could not be read.
    #[error("failed to read policy file {path}: {source}")]
    Io {
        /// Path to the policy file.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The policy file is not well-formed JSON.
    #[error("malformed policy JSON in {path}: {source}")]
    Parse {
        /// Path (or description) of the policy source.
        path: String,
        /// The underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// The policy is structurally or semantically invalid.
    ///
    /// Carries every violation found, not just the first, so a single
    /// load attempt reports the full repair list.
    #[error("policy validation failed with {} error(s): {}", errors.len(), format_errors(errors))]
    Validation {
        /// All validation failures found.
        errors: Vec<FieldError>,
    },
}

fn format_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for policy operations.
pub type PolicyResult<T> = Result<T, PolicyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_lists_every_field() {
        let err = PolicyError::Validation {
            errors: vec![
                FieldError::new("version", "missing required field"),
                FieldError::new("caps.daily.maxUsd", "must be a finite positive number"),
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("2 error(s)"));
        assert!(msg.contains("version: missing required field"));
        assert!(msg.contains("caps.daily.maxUsd"));
    }
}
