//! Unified error type for the storefront workspace.

use thiserror::Error;

/// Message surfaced when a request cannot be authenticated even after a
/// refresh attempt.
pub const AUTH_FAILED_MESSAGE: &str = "Authentication failed. Please log in again.";

/// Enumerates all error kinds that can occur across storefront crates.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A required input was missing or malformed (e.g. an empty URL).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The refresh step failed, or the retried request still failed.
    #[error("{0}")]
    Authentication(String),

    /// The server answered with a non-success status.
    ///
    /// `message` is the server-provided `error` field when present, otherwise
    /// `HTTP <status>: <reason>`.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// The request never produced a response (connect, TLS, timeout, ...).
    #[error("transport error: {0}")]
    Transport(String),

    /// A success response carried a body that is not valid JSON.
    #[error("decode error: {0}")]
    Decode(String),

    /// Persistent key-value storage failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// JSON serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// ── Feature-gated From impls ──────────────────────────────────────────────────

#[cfg(feature = "reqwest")]
impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for ClientError {
    fn from(e: sqlx::Error) -> Self {
        Self::Storage(e.to_string())
    }
}

impl ClientError {
    /// The canonical authentication failure.
    #[must_use]
    pub fn authentication() -> Self {
        Self::Authentication(AUTH_FAILED_MESSAGE.to_string())
    }

    /// Returns `true` if the error is likely transient and worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http { status, .. } => matches!(status, 408 | 429 | 500 | 502 | 503 | 504),
            Self::Transport(_) => true,
            _ => false,
        }
    }

    /// Returns the HTTP status for [`ClientError::Http`] errors.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, ClientError>;
