//! Domain types for slots and parked vehicles.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::actuator::{ActuatorCommand, ActuatorState, BarrierTimer};
use crate::ids::SlotId;
use crate::occupancy::Occupancy;

/// Live state of one monitored slot.
#[derive(Debug, Clone)]
pub struct Slot {
    id: SlotId,
    /// Last calibrated distance in centimetres.
    pub distance_cm: f32,
    /// Logical occupancy. Only set after a confirmed check-in.
    pub occupied: bool,
    barrier: BarrierTimer,
}

impl Slot {
    /// Create a free slot with a closed barrier.
    #[must_use]
    pub fn new(id: SlotId, max_distance_cm: f32, open_for: Duration, now: Instant) -> Self {
        Self {
            id,
            distance_cm: max_distance_cm,
            occupied: false,
            barrier: BarrierTimer::new(open_for, now),
        }
    }

    /// The slot id.
    #[must_use]
    pub const fn id(&self) -> SlotId {
        self.id
    }

    /// Logical occupancy as an enum.
    #[must_use]
    pub const fn occupancy(&self) -> Occupancy {
        Occupancy::from_flag(self.occupied)
    }

    /// Current actuator state.
    #[must_use]
    pub const fn actuator_state(&self) -> ActuatorState {
        self.barrier.state()
    }

    /// When the actuator entered its current state.
    #[must_use]
    pub const fn actuator_entered_at(&self) -> Instant {
        self.barrier.entered_at()
    }

    /// Request a barrier open cycle.
    pub fn arm_barrier(&mut self, now: Instant) {
        self.barrier.arm(now);
    }

    /// Step the barrier timer.
    pub fn advance_barrier(&mut self, now: Instant) -> Option<ActuatorCommand> {
        self.barrier.advance(now)
    }

    /// Force the barrier closed.
    pub fn close_barrier(&mut self, now: Instant) -> Option<ActuatorCommand> {
        self.barrier.force_close(now)
    }
}

/// A vehicle the parking service has confirmed as checked in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParkedVehicle {
    /// License plate as read at the slot.
    pub plate: String,
    /// Slot the vehicle occupies.
    pub slot_id: SlotId,
    /// Retained user identity after reconciliation. `None` if unknown.
    pub user_id: Option<String>,
    /// Server history id for this parking session.
    pub history_id: Option<String>,
    /// Server check-in timestamp, empty if the server did not send one.
    #[serde(default)]
    pub check_in_time: String,
    /// Server check-out timestamp, empty until check-out is confirmed.
    #[serde(default)]
    pub check_out_time: String,
    /// When the registry accepted the vehicle.
    pub parked_at: DateTime<Utc>,
}

impl ParkedVehicle {
    /// Returns `true` if the vehicle has a history id to check out with.
    #[must_use]
    pub const fn can_check_out(&self) -> bool {
        self.history_id.is_some()
    }

    /// How long the vehicle has been parked as of `now`.
    #[must_use]
    pub fn parked_for(&self, now: DateTime<Utc>) -> chrono::Duration {
        now.signed_duration_since(self.parked_at)
    }
}
