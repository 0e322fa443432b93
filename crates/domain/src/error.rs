//! Unified error types for the domain layer
//!
//! Provides a common error type for invariant violations so that the engine
//! can map them onto user-facing replies without resorting to strings.

use thiserror::Error;

/// Unified error type for domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Validation failed (e.g., invalid field values)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Invalid ID format
    #[error("Invalid ID format: {0}")]
    InvalidId(String),

    /// A normalized tag has no characters left
    #[error("Game tag is empty")]
    EmptyTag,

    /// A tag exceeds the maximum length
    #[error("Game tag exceeds {max} characters")]
    TagTooLong { max: usize },

    /// Free text is empty after trimming
    #[error("Text is empty")]
    EmptyText,

    /// Free text exceeds the maximum length
    #[error("Text exceeds {max} characters")]
    TextTooLong { max: usize },

    /// Business rule violation
    #[error("Constraint violation: {0}")]
    Constraint(String),

    /// Parse error (for value objects)
    #[error("Parse error: {0}")]
    Parse(String),
}

impl DomainError {
    /// Creates a validation error for business rule violations.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a constraint violation error
    pub fn constraint(msg: impl Into<String>) -> Self {
        Self::Constraint(msg.into())
    }

    /// Create an invalid ID error
    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    /// Creates a parse error for string-to-type conversion failures.
    ///
    /// Use this in `FromStr` implementations when the input string
    /// doesn't match any known variant, e.g. a stored session state that
    /// no longer exists.
    ///
    /// # Example
    /// ```ignore
    /// impl FromStr for GameKind {
    ///     type Err = DomainError;
    ///     fn from_str(s: &str) -> Result<Self, Self::Err> {
    ///         match s {
    ///             "poetic" => Ok(Self::Poetic),
    ///             _ => Err(DomainError::parse(format!("Unknown game kind: {}", s))),
    ///         }
    ///     }
    /// }
    /// ```
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error() {
        let err = DomainError::validation("nickname cannot be empty");
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(err.to_string(), "Validation failed: nickname cannot be empty");
    }

    #[test]
    fn test_constraint_error() {
        let err = DomainError::constraint("player is not in a game");
        assert_eq!(
            err.to_string(),
            "Constraint violation: player is not in a game"
        );
    }

    #[test]
    fn test_length_errors_mention_limit() {
        assert_eq!(
            DomainError::TagTooLong { max: 64 }.to_string(),
            "Game tag exceeds 64 characters"
        );
        assert_eq!(
            DomainError::TextTooLong { max: 300 }.to_string(),
            "Text exceeds 300 characters"
        );
    }
}
