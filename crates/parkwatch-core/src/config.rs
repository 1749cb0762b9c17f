//! Sensing configuration.
//!
//! Thresholds and timings for the sampler, the occupancy debouncer and the
//! barrier actuator. All values have serde defaults so a partial config is
//! valid.

use std::time::Duration;

use serde::Deserialize;

use crate::error::{CoreError, Result};

/// Configuration for distance sensing, occupancy and actuator timing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SensingConfig {
    /// A reading below this distance (cm) turns a free slot occupied.
    #[serde(default = "SensingConfig::default_occupy_threshold")]
    pub occupy_threshold_cm: f32,

    /// A reading at or above this distance (cm) turns an occupied slot free.
    /// Must be larger than `occupy_threshold_cm`.
    #[serde(default = "SensingConfig::default_free_threshold")]
    pub free_threshold_cm: f32,

    /// Maximum sensor range (cm). Invalid and out-of-range readings clamp here.
    #[serde(default = "SensingConfig::default_max_distance")]
    pub max_distance_cm: f32,

    /// How long the barrier stays open before auto-closing, in milliseconds.
    #[serde(default = "SensingConfig::default_open_duration")]
    pub open_duration_ms: u64,
}

impl SensingConfig {
    const fn default_occupy_threshold() -> f32 {
        10.0
    }

    const fn default_free_threshold() -> f32 {
        14.0
    }

    const fn default_max_distance() -> f32 {
        400.0
    }

    const fn default_open_duration() -> u64 {
        3000
    }

    /// Get the barrier open duration as a `Duration`.
    #[must_use]
    pub const fn open_duration(&self) -> Duration {
        Duration::from_millis(self.open_duration_ms)
    }

    /// Check that the thresholds form a valid hysteresis band.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidConfig` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("occupy_threshold_cm", self.occupy_threshold_cm),
            ("free_threshold_cm", self.free_threshold_cm),
            ("max_distance_cm", self.max_distance_cm),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(CoreError::InvalidConfig {
                    field,
                    message: format!("must be a positive number, got {value}"),
                });
            }
        }

        if self.free_threshold_cm <= self.occupy_threshold_cm {
            return Err(CoreError::InvalidConfig {
                field: "free_threshold_cm",
                message: format!(
                    "must exceed occupy_threshold_cm ({} <= {})",
                    self.free_threshold_cm, self.occupy_threshold_cm
                ),
            });
        }

        if self.max_distance_cm < self.free_threshold_cm {
            return Err(CoreError::InvalidConfig {
                field: "max_distance_cm",
                message: "must not be below free_threshold_cm".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for SensingConfig {
    fn default() -> Self {
        Self {
            occupy_threshold_cm: Self::default_occupy_threshold(),
            free_threshold_cm: Self::default_free_threshold(),
            max_distance_cm: Self::default_max_distance(),
            open_duration_ms: Self::default_open_duration(),
        }
    }
}
