//! Synchronization error types.

use parkwatch_auth::{AuthError, TransportError};
use thiserror::Error;

/// A result type using `SyncError`.
pub type Result<T> = std::result::Result<T, SyncError>;

/// Errors that can occur while talking to the parking service.
#[derive(Debug, Error)]
pub enum SyncError {
    /// No HTTP response was received.
    #[error("transport error: {0}")]
    Transport(TransportError),

    /// Authentication failed or was exhausted.
    #[error("authentication error: {0}")]
    Auth(AuthError),

    /// The plate or resource does not exist on the server.
    #[error("not found: {0}")]
    NotFound(String),

    /// The response body is not a JSON document.
    #[error("unparsable response: {0}")]
    SchemaMismatch(String),

    /// The server answered with a success status but omitted the field that
    /// confirms the operation.
    #[error("operation not confirmed: {0}")]
    Confirmation(String),

    /// The server answered with a status the operation does not accept.
    #[error("unexpected HTTP {status}: {body}")]
    UnexpectedStatus {
        /// HTTP status code.
        status: u16,
        /// Body excerpt.
        body: String,
    },

    /// Check-out was requested without a history id.
    #[error("no history id to check out with")]
    MissingHistoryId,
}

impl From<AuthError> for SyncError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Transport(e) => Self::Transport(e),
            other => Self::Auth(other),
        }
    }
}

impl From<TransportError> for SyncError {
    fn from(err: TransportError) -> Self {
        Self::Transport(err)
    }
}

impl SyncError {
    /// Returns `true` if the same call may succeed if attempted again later.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Auth(e) => e.is_retriable(),
            Self::UnexpectedStatus { status, .. } => *status >= 500,
            Self::NotFound(_)
            | Self::SchemaMismatch(_)
            | Self::Confirmation(_)
            | Self::MissingHistoryId => false,
        }
    }

    /// Returns `true` for outcomes that describe a valid server state rather
    /// than a failure.
    #[must_use]
    pub const fn is_expected_state(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
