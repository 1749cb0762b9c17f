//! The per-tick orchestrator.
//!
//! Each tick walks the slots in order. For every slot the barrier timer is
//! advanced, one distance is measured and debounced against the slot's
//! logical occupancy, and an edge triggers the arrival or departure flow.
//! Local state only changes once the parking service has confirmed a
//! check-in; departures always release the slot.

use std::time::Instant;

use chrono::Utc;
use parkwatch_auth::AuthError;
use parkwatch_core::{
    DistanceSampler, Hysteresis, Occupancy, ParkedVehicle, ParkingRegistry, SensingConfig, Slot,
    SlotId, Transition,
};
use parkwatch_sync::{Coordinator, PlateLookup, ReconcileOutcome, ResolverClient, SyncError};
use tracing::{debug, error, info, warn};

use crate::error::{MonitorError, Result};
use crate::hardware::{Bay, PlateSource};
use crate::status;

/// Something that happened to a slot during a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotEvent {
    /// The service confirmed a check-in and the slot is now occupied.
    CheckedIn {
        /// Slot id.
        slot: SlotId,
        /// Plate read at the slot.
        plate: String,
        /// Identity retained after reconciliation.
        user_id: Option<String>,
        /// Server history id.
        history_id: String,
        /// How the local and server identities compared.
        outcome: ReconcileOutcome,
    },
    /// A vehicle arrived but check-in was not confirmed. Retried next tick.
    CheckInFailed {
        /// Slot id.
        slot: SlotId,
        /// Plate read at the slot.
        plate: String,
        /// Why the check-in failed.
        reason: String,
    },
    /// The service confirmed a check-out.
    CheckedOut {
        /// Slot id.
        slot: SlotId,
        /// Plate of the departed vehicle.
        plate: String,
        /// Server check-out timestamp.
        check_out_time: String,
        /// Server-computed parking duration.
        duration_minutes: Option<i64>,
    },
    /// A vehicle left but check-out was not confirmed. The slot is released
    /// anyway.
    CheckOutFailed {
        /// Slot id.
        slot: SlotId,
        /// Plate of the departed vehicle, if one was registered.
        plate: Option<String>,
        /// Why the check-out failed.
        reason: String,
    },
    /// A vehicle arrived while every registry entry was taken.
    CapacityReached {
        /// Slot id.
        slot: SlotId,
        /// Registry capacity.
        capacity: usize,
    },
}

impl SlotEvent {
    /// The slot this event concerns.
    #[must_use]
    pub const fn slot(&self) -> SlotId {
        match self {
            Self::CheckedIn { slot, .. }
            | Self::CheckInFailed { slot, .. }
            | Self::CheckedOut { slot, .. }
            | Self::CheckOutFailed { slot, .. }
            | Self::CapacityReached { slot, .. } => *slot,
        }
    }
}

/// Owns the slots, their hardware and the registry, and drives them against
/// the parking service.
pub struct ParkingMonitor {
    slots: Vec<Slot>,
    bays: Vec<Bay>,
    registry: ParkingRegistry,
    sampler: DistanceSampler,
    hysteresis: Hysteresis,
    plates: Box<dyn PlateSource>,
    resolver: ResolverClient,
    coordinator: Coordinator,
}

impl ParkingMonitor {
    /// Create a monitor with one slot per bay, numbered from 1.
    ///
    /// Every barrier is closed and every indicator set to free.
    ///
    /// # Errors
    ///
    /// Returns `MonitorError::Config` if `bays` is empty and
    /// `MonitorError::Core` if the sensing configuration is invalid.
    pub fn new(
        sensing: &SensingConfig,
        mut bays: Vec<Bay>,
        plates: impl PlateSource + 'static,
        resolver: ResolverClient,
        coordinator: Coordinator,
        now: Instant,
    ) -> Result<Self> {
        if bays.is_empty() {
            return Err(MonitorError::Config("at least one bay is required".to_string()));
        }
        let hysteresis = Hysteresis::from_config(sensing)?;

        let slots: Vec<Slot> = (0..bays.len())
            .map(|i| {
                Slot::new(
                    SlotId::from_index(i),
                    sensing.max_distance_cm,
                    sensing.open_duration(),
                    now,
                )
            })
            .collect();

        for bay in &mut bays {
            bay.actuator.close();
            bay.actuator.indicate(Occupancy::Free);
        }

        info!(slots = slots.len(), "parking monitor ready");

        Ok(Self {
            registry: ParkingRegistry::with_capacity(slots.len()),
            slots,
            bays,
            sampler: DistanceSampler::from_config(sensing),
            hysteresis,
            plates: Box::new(plates),
            resolver,
            coordinator,
        })
    }

    /// Limit how many vehicles may be checked in at once.
    ///
    /// Defaults to the slot count. Vehicles already registered are kept.
    ///
    /// # Errors
    ///
    /// Returns `MonitorError::Config` unless `capacity` is between 1 and the
    /// slot count, and `MonitorError::Core` if more vehicles are parked than
    /// `capacity` allows.
    pub fn with_capacity(mut self, capacity: usize) -> Result<Self> {
        if capacity == 0 || capacity > self.slots.len() {
            return Err(MonitorError::Config(format!(
                "capacity must be within 1..={}, got {capacity}",
                self.slots.len()
            )));
        }
        let mut registry = ParkingRegistry::with_capacity(capacity);
        for vehicle in self.registry.iter() {
            registry.insert(vehicle.clone())?;
        }
        self.registry = registry;
        Ok(self)
    }

    /// All slots in id order.
    #[must_use]
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Look up a slot.
    #[must_use]
    pub fn slot(&self, id: SlotId) -> Option<&Slot> {
        self.slots.get(id.index())
    }

    /// Confirmed parked vehicles.
    #[must_use]
    pub const fn registry(&self) -> &ParkingRegistry {
        &self.registry
    }

    /// Render the slot table.
    #[must_use]
    pub fn status_table(&self) -> String {
        status::render(&self.slots, &self.registry)
    }

    /// Log in and resolve `plate` once.
    ///
    /// # Errors
    ///
    /// Returns the login error. Lookup failures are reported through the
    /// returned [`PlateLookup`].
    pub async fn self_test(&self, plate: &str) -> std::result::Result<PlateLookup, AuthError> {
        info!(plate = %plate, "running service self-test");
        self.resolver.client().session().login().await?;
        Ok(self.resolver.resolve_user_by_plate(plate).await)
    }

    /// Run one pass over every slot.
    pub async fn tick(&mut self, now: Instant) -> Vec<SlotEvent> {
        let mut events = Vec::new();
        for index in 0..self.slots.len() {
            if let Some(event) = self.tick_slot(index, now).await {
                events.push(event);
            }
        }
        info!("slot status\n{}", self.status_table());
        events
    }

    async fn tick_slot(&mut self, index: usize, now: Instant) -> Option<SlotEvent> {
        if let Some(command) = self.slots[index].advance_barrier(now) {
            self.bays[index].actuator.apply(command);
        }

        let reading = self.bays[index].sensor.measure();
        let distance = self.sampler.calibrate(reading);
        let slot = &mut self.slots[index];
        slot.distance_cm = distance;
        debug!(slot = %slot.id(), distance_cm = distance, "measured");

        match self.hysteresis.transition(slot.occupancy(), distance)? {
            Transition::Arrived => Some(self.handle_arrival(index, now).await),
            Transition::Departed => Some(self.handle_departure(index, now).await),
        }
    }

    async fn handle_arrival(&mut self, index: usize, now: Instant) -> SlotEvent {
        let slot = self.slots[index].id();

        if self.registry.is_full() {
            let capacity = self.registry.capacity();
            warn!(slot = %slot, capacity, "vehicle detected but the lot is full");
            return SlotEvent::CapacityReached { slot, capacity };
        }

        let plate = self.plates.next_plate(slot);
        info!(slot = %slot, plate = %plate, "vehicle arrived");

        let lookup = self.resolver.resolve_user_by_plate(&plate).await;
        let receipt = match self.coordinator.check_in(lookup.identity(), &plate, slot).await {
            Ok(receipt) => receipt,
            Err(e) => {
                warn!(slot = %slot, plate = %plate, error = %e, "check-in not confirmed, slot stays free");
                return SlotEvent::CheckInFailed {
                    slot,
                    plate,
                    reason: e.to_string(),
                };
            }
        };

        if let Err(e) = self
            .coordinator
            .update_slot_advisory(slot, Occupancy::Occupied)
            .await
        {
            log_advisory_failure(slot, &e);
        }

        let user_id = receipt.reconciliation.retained.clone();
        let vehicle = ParkedVehicle {
            plate: plate.clone(),
            slot_id: slot,
            user_id: user_id.clone(),
            history_id: Some(receipt.history_id.clone()),
            check_in_time: receipt.check_in_time.clone(),
            check_out_time: String::new(),
            parked_at: Utc::now(),
        };
        if let Err(e) = self.registry.insert(vehicle) {
            error!(slot = %slot, error = %e, "registry rejected confirmed vehicle");
            return SlotEvent::CheckInFailed {
                slot,
                plate,
                reason: e.to_string(),
            };
        }

        let state = &mut self.slots[index];
        state.arm_barrier(now);
        state.occupied = true;
        self.bays[index].actuator.indicate(Occupancy::Occupied);

        info!(
            slot = %slot,
            plate = %plate,
            user_id = user_id.as_deref().unwrap_or("-"),
            history_id = %receipt.history_id,
            "vehicle checked in"
        );

        SlotEvent::CheckedIn {
            slot,
            plate,
            user_id,
            history_id: receipt.history_id,
            outcome: receipt.reconciliation.outcome,
        }
    }

    async fn handle_departure(&mut self, index: usize, now: Instant) -> SlotEvent {
        let slot = self.slots[index].id();

        let event = match self.registry.get(slot).cloned() {
            None => {
                warn!(slot = %slot, "vehicle left a slot with no registered vehicle");
                SlotEvent::CheckOutFailed {
                    slot,
                    plate: None,
                    reason: "no registered vehicle".to_string(),
                }
            }
            Some(vehicle) if vehicle.can_check_out() => {
                let history_id = vehicle.history_id.clone().unwrap_or_default();
                self.check_out(slot, vehicle.plate, &history_id).await
            }
            Some(vehicle) => {
                warn!(slot = %slot, plate = %vehicle.plate, "no history id, skipping check-out");
                SlotEvent::CheckOutFailed {
                    slot,
                    plate: Some(vehicle.plate),
                    reason: SyncError::MissingHistoryId.to_string(),
                }
            }
        };

        if let Err(e) = self
            .coordinator
            .update_slot_advisory(slot, Occupancy::Free)
            .await
        {
            log_advisory_failure(slot, &e);
        }

        if let Some(vehicle) = self.registry.remove(slot) {
            info!(
                slot = %slot,
                plate = %vehicle.plate,
                parked_minutes = vehicle.parked_for(Utc::now()).num_minutes(),
                "vehicle removed"
            );
        }

        let state = &mut self.slots[index];
        if let Some(command) = state.close_barrier(now) {
            self.bays[index].actuator.apply(command);
        }
        state.occupied = false;
        self.bays[index].actuator.indicate(Occupancy::Free);

        event
    }

    async fn check_out(&mut self, slot: SlotId, plate: String, history_id: &str) -> SlotEvent {
        match self.coordinator.check_out(history_id).await {
            Ok(receipt) => {
                if let Some(parked) = self.registry.get_mut(slot) {
                    parked.check_out_time.clone_from(&receipt.check_out_time);
                }
                info!(
                    slot = %slot,
                    plate = %plate,
                    check_out_time = %receipt.check_out_time,
                    duration_minutes = ?receipt.duration_minutes,
                    "vehicle checked out"
                );
                SlotEvent::CheckedOut {
                    slot,
                    plate,
                    check_out_time: receipt.check_out_time,
                    duration_minutes: receipt.duration_minutes,
                }
            }
            Err(e) => {
                if e.is_expected_state() {
                    info!(slot = %slot, plate = %plate, history_id = %history_id, reason = %e, "server has no open session, releasing slot");
                } else {
                    warn!(slot = %slot, plate = %plate, error = %e, "check-out not confirmed, releasing slot");
                }
                SlotEvent::CheckOutFailed {
                    slot,
                    plate: Some(plate),
                    reason: e.to_string(),
                }
            }
        }
    }
}

fn log_advisory_failure(slot: SlotId, error: &SyncError) {
    if error.is_expected_state() {
        debug!(slot = %slot, reason = %error, "slot unknown to the server");
    } else {
        warn!(slot = %slot, error = %error, "slot status update failed");
    }
}

impl std::fmt::Debug for ParkingMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParkingMonitor")
            .field("slots", &self.slots)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_reports_its_slot() {
        let slot = SlotId::new(3).unwrap();
        let events = [
            SlotEvent::CapacityReached { slot, capacity: 3 },
            SlotEvent::CheckOutFailed {
                slot,
                plate: None,
                reason: "no registered vehicle".to_string(),
            },
            SlotEvent::CheckInFailed {
                slot,
                plate: "51D-22222".to_string(),
                reason: "HTTP 500".to_string(),
            },
        ];
        assert!(events.iter().all(|e| e.slot() == slot));
    }
}
