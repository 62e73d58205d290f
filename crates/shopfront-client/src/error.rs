//! # Client Error Types
//!
//! Error types for transport, session and reauthentication failures.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Client Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Transport     │  │     Backend             │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Http           │  │  Status (non-2xx)       │ │
//! │  │  ConfigLoad     │  │  InvalidResponse│  │  Rejected (status:false)│ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │    Session      │  │   Validation    │  │   Reauthentication      │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  Storage        │  │  Validation     │  │  Reauth(Cancelled)      │ │
//! │  │  Serialization  │  │  (login form)   │  │  Reauth(Failed)         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Authentication Status Codes
//! `401` and `419` mean "session expired" and route the request through the
//! reauthentication gate. When they (or `422`) come back from the
//! reauthentication endpoint itself they mean "wrong password".

use shopfront_core::ValidationError;
use thiserror::Error;

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Status codes the backend uses for an expired or missing session.
pub const AUTH_FAILURE_STATUSES: [u16; 2] = [401, 419];

/// Client error type covering every failure an API call can surface.
#[derive(Debug, Error)]
pub enum ClientError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid client configuration.
    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),

    /// Failed to read the config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body did not have the expected shape.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// JSON encoding or decoding failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // =========================================================================
    // Backend Errors
    // =========================================================================
    /// Non-2xx response.
    #[error("Request failed with status {status}: {message}")]
    Status { status: u16, message: String },

    /// 2xx response whose envelope carried `status: false`.
    #[error("Request rejected: {0}")]
    Rejected(String),

    // =========================================================================
    // Session Errors
    // =========================================================================
    /// Session storage could not be read or written.
    #[error("Session storage error: {0}")]
    Storage(String),

    // =========================================================================
    // Input and Reauthentication Errors
    // =========================================================================
    /// Form input failed validation before any request was sent.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The reauthentication episode this request joined did not succeed.
    #[error(transparent)]
    Reauth(#[from] ReauthError),
}

impl ClientError {
    /// HTTP status of a [`ClientError::Status`] error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for the 401/419 responses that start a reauthentication episode.
    pub fn is_auth_failure(&self) -> bool {
        self.status_code()
            .map_or(false, |status| AUTH_FAILURE_STATUSES.contains(&status))
    }

    /// True when the reauthentication endpoint refused the password.
    pub fn is_credentials_rejected(&self) -> bool {
        self.is_auth_failure() || self.status_code() == Some(422)
    }

    /// True when the user dismissed the reauthentication prompt.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ClientError::Reauth(ReauthError::Cancelled))
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::Storage(err.to_string())
    }
}

impl From<toml::de::Error> for ClientError {
    fn from(err: toml::de::Error) -> Self {
        ClientError::InvalidConfig(err.to_string())
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::InvalidConfig(format!("invalid URL: {}", err))
    }
}

// =============================================================================
// Reauthentication Error
// =============================================================================

/// Terminal outcome of a failed reauthentication episode.
///
/// Cloned to every request that joined the episode, so callers can tell a
/// cancelled prompt apart from a backend failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReauthError {
    /// The user dismissed the prompt.
    #[error("Reauthentication cancelled")]
    Cancelled,

    /// Reauthentication could not complete.
    #[error("Reauthentication failed: {0}")]
    Failed(String),
}
