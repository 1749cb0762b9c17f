//! Occupancy debouncing with a hysteresis band.
//!
//! ```text
//!            distance < occupy threshold
//!    ┌──────┐ ─────────────────────────▶ ┌──────────┐
//!    │ Free │                            │ Occupied │
//!    └──────┘ ◀───────────────────────── └──────────┘
//!            distance >= free threshold
//! ```
//!
//! Readings inside `[occupy, free)` hold whatever state the slot is in.

use serde::{Deserialize, Serialize};

use crate::config::SensingConfig;
use crate::error::Result;

/// Logical occupancy of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Occupancy {
    /// Nothing parked.
    #[default]
    Free,
    /// A vehicle is parked.
    Occupied,
}

impl Occupancy {
    /// Map the slot's `occupied` flag to an occupancy value.
    #[must_use]
    pub const fn from_flag(occupied: bool) -> Self {
        if occupied {
            Self::Occupied
        } else {
            Self::Free
        }
    }

    /// Returns `true` for `Occupied`.
    #[must_use]
    pub const fn is_occupied(self) -> bool {
        matches!(self, Self::Occupied)
    }

    /// The wire name used in slot status advisories.
    #[must_use]
    pub const fn as_status(self) -> &'static str {
        match self {
            Self::Free => "available",
            Self::Occupied => "occupied",
        }
    }
}

/// An edge produced by the debouncer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// `Free -> Occupied`: a vehicle arrived.
    Arrived,
    /// `Occupied -> Free`: the vehicle left.
    Departed,
}

/// Two-threshold occupancy filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hysteresis {
    occupy_below_cm: f32,
    free_at_or_above_cm: f32,
}

impl Hysteresis {
    /// Build a filter from the sensing configuration.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidConfig` if the thresholds do not form a band.
    pub fn from_config(config: &SensingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            occupy_below_cm: config.occupy_threshold_cm,
            free_at_or_above_cm: config.free_threshold_cm,
        })
    }

    /// Build a filter from explicit thresholds.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidConfig` if `free_cm <= occupy_cm`.
    pub fn new(occupy_cm: f32, free_cm: f32) -> Result<Self> {
        Self::from_config(&SensingConfig {
            occupy_threshold_cm: occupy_cm,
            free_threshold_cm: free_cm,
            max_distance_cm: free_cm.max(SensingConfig::default().max_distance_cm),
            ..SensingConfig::default()
        })
    }

    /// Compute the next occupancy for a reading.
    ///
    /// A non-finite reading counts as "nothing in range".
    #[must_use]
    pub fn next(&self, current: Occupancy, distance_cm: f32) -> Occupancy {
        if !distance_cm.is_finite() {
            return Occupancy::Free;
        }
        match current {
            Occupancy::Free if distance_cm < self.occupy_below_cm => Occupancy::Occupied,
            Occupancy::Occupied if distance_cm >= self.free_at_or_above_cm => Occupancy::Free,
            held => held,
        }
    }

    /// Evaluate a reading and report the edge, if any.
    #[must_use]
    pub fn transition(&self, current: Occupancy, distance_cm: f32) -> Option<Transition> {
        match (current, self.next(current, distance_cm)) {
            (Occupancy::Free, Occupancy::Occupied) => Some(Transition::Arrived),
            (Occupancy::Occupied, Occupancy::Free) => Some(Transition::Departed),
            _ => None,
        }
    }
}
