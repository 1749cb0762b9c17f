//! Monitor error types.

use parkwatch_core::CoreError;
use thiserror::Error;

/// A result type using `MonitorError`.
pub type Result<T> = std::result::Result<T, MonitorError>;

/// Errors raised while setting up the monitor.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// A setting is missing or out of range.
    #[error("configuration error: {0}")]
    Config(String),

    /// A core invariant was violated.
    #[error(transparent)]
    Core(#[from] CoreError),
}
