//! Common error types for parkwatch.
//!
//! This module provides error types shared by the sensing, configuration and
//! registry layers.

use crate::ids::{IdError, SlotId};
use thiserror::Error;

/// A result type using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core errors that can occur throughout the parkwatch system.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An invalid identifier was provided.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] IdError),

    /// A configuration value is out of range or inconsistent.
    #[error("invalid configuration: {field}: {message}")]
    InvalidConfig {
        /// The offending field.
        field: &'static str,
        /// Why the value was rejected.
        message: String,
    },

    /// The registry already holds a vehicle for this slot.
    #[error("slot {0} already has a parked vehicle")]
    SlotTaken(SlotId),

    /// The registry has no room for another vehicle.
    #[error("registry is full ({capacity} vehicles)")]
    RegistryFull {
        /// Maximum number of parked vehicles.
        capacity: usize,
    },
}

impl CoreError {
    /// Returns `true` if this error comes from configuration validation.
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(self, Self::InvalidConfig { .. })
    }

    /// Returns `true` if this error is a registry membership conflict.
    #[must_use]
    pub const fn is_registry_error(&self) -> bool {
        matches!(self, Self::SlotTaken(_) | Self::RegistryFull { .. })
    }
}
