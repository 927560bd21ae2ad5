// =============================================================================
// ERROR MODULE
// =============================================================================
// Error types shared by the API client, stores, session and storage.
//
// ERROR HANDLING PHILOSOPHY:
// - Stores swallow read failures into their `error` field
// - Write operations and auth calls hand the error back to the caller
// - Every error maps to one of four kinds the UI knows how to show
//
// LEARNING NOTES:
// - thiserror derives Display from the `#[error(...)]` attributes
// - `#[from]` generates a `From` impl, which is what lets `?` convert a
//   reqwest or serde_json error into ClientError at the call site
// =============================================================================

use thiserror::Error;

/// Message used when an error response body cannot be parsed.
pub const FALLBACK_ERROR_MESSAGE: &str = "Network error";

// =============================================================================
// CUSTOM ERROR TYPE
// =============================================================================
#[derive(Debug, Error)]
pub enum ClientError {
    // -------------------------------------------------------------------------
    // NETWORK / API ERRORS
    // -------------------------------------------------------------------------
    /// The request never produced a response (DNS, refused, timeout, TLS)
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with a non-2xx status
    #[error("{message}")]
    Api { status: u16, message: String },

    /// The response body did not match the expected schema
    #[error("Unexpected response: {0}")]
    Decode(#[from] serde_json::Error),

    // -------------------------------------------------------------------------
    // AUTHENTICATION ERRORS
    // -------------------------------------------------------------------------
    /// Bad credentials, or the held token was rejected (HTTP 401)
    #[error("{0}")]
    Unauthorized(String),

    // -------------------------------------------------------------------------
    // VALIDATION ERRORS
    // -------------------------------------------------------------------------
    /// A field failed client-side validation; never sent to the server
    #[error("{field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    // -------------------------------------------------------------------------
    // LOCAL ERRORS
    // -------------------------------------------------------------------------
    /// An entity was not found in a local tier
    #[error("Not found: {0}")]
    NotFound(String),

    /// Durable storage could not be read or written
    #[error("Storage error: {0}")]
    Storage(String),

    /// Anything else
    #[error("Internal error: {0}")]
    Internal(String),
}

// =============================================================================
// ERROR KINDS
// =============================================================================
/// How an error is surfaced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unreachable host, non-2xx response, malformed body: transient notice
    Network,
    /// Per-field message next to the offending input
    Validation,
    /// Inline form error on the sign-in page
    Authentication,
    /// Local failures (storage, missing fixture rows)
    Unexpected,
}

impl ClientError {
    /// Shorthand for a validation failure on one field.
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        ClientError::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Transport(_) | ClientError::Api { .. } | ClientError::Decode(_) => {
                ErrorKind::Network
            }
            ClientError::Unauthorized(_) => ErrorKind::Authentication,
            ClientError::Validation { .. } => ErrorKind::Validation,
            ClientError::NotFound(_) | ClientError::Storage(_) | ClientError::Internal(_) => {
                ErrorKind::Unexpected
            }
        }
    }

    /// Whether a read that failed this way may be served from the fixture tier.
    pub fn allows_fallback(&self) -> bool {
        self.kind() == ErrorKind::Network
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Unauthorized(_) => Some(401),
            ClientError::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

// =============================================================================
// RESULT TYPE ALIAS
// =============================================================================
pub type ClientResult<T> = Result<T, ClientError>;

// =============================================================================
// CONVERSION HELPERS
// =============================================================================
// LEARNING NOTE:
// These backends fail with their own error types. Folding them into
// `Storage` keeps ClientError free of backend-specific variants.

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::Storage(err.to_string())
    }
}

impl From<redis::RedisError> for ClientError {
    fn from(err: redis::RedisError) -> Self {
        ClientError::Storage(err.to_string())
    }
}

impl From<anyhow::Error> for ClientError {
    fn from(err: anyhow::Error) -> Self {
        ClientError::Internal(err.to_string())
    }
}
