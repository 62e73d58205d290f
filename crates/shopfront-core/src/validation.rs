//! # Validation Module
//!
//! Input validation for the login and reauthentication forms.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Form (front-end)                                             │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Client (Rust)                                                │
//! │  └── THIS MODULE: checked before any request leaves the client         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Backend                                                      │
//! │  └── Credential check, account state                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use shopfront_core::validation::validate_credentials;
//!
//! assert!(validate_credentials("cashier", "secret1").is_ok());
//! assert!(validate_credentials("", "secret1").is_err());
//! ```

use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Validates a username.
///
/// ## Rules
/// - Must not be empty after trimming
pub fn validate_username(username: &str) -> ValidationResult<()> {
    if username.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "username".to_string(),
        });
    }

    Ok(())
}

/// Validates a password.
///
/// ## Rules
/// - Must be at least [`MIN_PASSWORD_LEN`] characters (not trimmed: spaces count)
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::Required {
            field: "password".to_string(),
        });
    }

    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: MIN_PASSWORD_LEN,
        });
    }

    Ok(())
}

/// Validates a full login form, username first.
pub fn validate_credentials(username: &str, password: &str) -> ValidationResult<()> {
    validate_username(username)?;
    validate_password(password)
}

// =============================================================================
// Unit Tests
// =============================================================================
