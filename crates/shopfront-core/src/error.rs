//! # Errors
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ValidationError ──► CoreError ──► ClientError (shopfront-client)       │
//! │   login form          this crate    network, session, reauth            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Pricing is total: cart mutations with bad arguments are ignored, so only
//! the login form can fail here.

use thiserror::Error;

/// Anything this crate can report.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),
}

/// A login form field that cannot be submitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },
}

impl ValidationError {
    /// Name of the offending form field, for highlighting it in the UI.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field } | ValidationError::TooShort { field, .. } => field,
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_field() {
        let missing = ValidationError::Required {
            field: "username".into(),
        };
        let short = ValidationError::TooShort {
            field: "password".into(),
            min: 6,
        };

        assert_eq!(missing.to_string(), "username is required");
        assert_eq!(short.to_string(), "password must be at least 6 characters");
        assert_eq!(short.field(), "password");
    }

    #[test]
    fn test_wraps_into_core_error() {
        let err: CoreError = ValidationError::Required {
            field: "username".into(),
        }
        .into();

        assert_eq!(err.to_string(), "invalid input: username is required");
    }
}
