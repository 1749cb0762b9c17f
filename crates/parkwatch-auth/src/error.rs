//! Authentication and transport error types.

use parkwatch_core::DocumentError;
use thiserror::Error;

/// A result type using `AuthError`.
pub type Result<T> = std::result::Result<T, AuthError>;

/// The request never produced an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Connecting or sending failed.
    #[error("request to {url} failed: {message}")]
    Request {
        /// Target URL.
        url: String,
        /// Underlying failure.
        message: String,
    },

    /// The request did not complete within the client timeout.
    #[error("request to {url} timed out")]
    Timeout {
        /// Target URL.
        url: String,
    },

    /// The response body could not be read.
    #[error("failed to read response body from {url}: {message}")]
    Body {
        /// Target URL.
        url: String,
        /// Underlying failure.
        message: String,
    },
}

/// Errors that can occur while authenticating or sending authorized requests.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No HTTP response was received.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The login endpoint rejected the credentials or answered with a
    /// non-200 status.
    #[error("login failed: {0}")]
    LoginFailed(String),

    /// Login returned 200 but no token was found in any known location.
    #[error("login response did not contain a token")]
    TokenMissing,

    /// The server kept answering 401 after the allowed number of re-logins.
    #[error("still unauthorized after {attempts} re-login attempt(s)")]
    RefreshExhausted {
        /// Re-logins performed before giving up.
        attempts: u32,
    },

    /// The login response body is not a JSON document.
    #[error("invalid login response: {0}")]
    Document(#[from] DocumentError),
}

impl AuthError {
    /// Returns `true` if the same call may succeed on a later attempt
    /// without any change in configuration.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::RefreshExhausted { .. })
    }

    /// Returns the HTTP status code that best describes this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::LoginFailed(_) | Self::TokenMissing | Self::RefreshExhausted { .. } => 401,
            Self::Transport(TransportError::Timeout { .. }) => 504,
            Self::Transport(_) | Self::Document(_) => 502,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(AuthError::TokenMissing.http_status_code(), 401);
        assert_eq!(
            AuthError::RefreshExhausted { attempts: 1 }.http_status_code(),
            401
        );
        assert_eq!(
            AuthError::from(TransportError::Timeout {
                url: "http://x".into()
            })
            .http_status_code(),
            504
        );
        assert_eq!(
            AuthError::from(DocumentError::Empty).http_status_code(),
            502
        );
    }

    #[test]
    fn retriable() {
        let transport = TransportError::Request {
            url: "http://x".into(),
            message: "connection refused".into(),
        };
        assert!(AuthError::from(transport).is_retriable());
        assert!(!AuthError::LoginFailed("HTTP 403".into()).is_retriable());
        assert!(!AuthError::TokenMissing.is_retriable());
    }
}
