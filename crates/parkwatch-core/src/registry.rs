//! In-memory table of parked vehicles.
//!
//! The registry is ordered by insertion and keyed by slot id. It is owned by
//! the monitor and only changed after the parking service has confirmed a
//! check-in or a check-out was attempted.

use crate::error::{CoreError, Result};
use crate::ids::SlotId;
use crate::types::ParkedVehicle;

/// Parked vehicles, at most one per slot.
#[derive(Debug, Clone, Default)]
pub struct ParkingRegistry {
    vehicles: Vec<ParkedVehicle>,
    capacity: usize,
}

impl ParkingRegistry {
    /// Create an empty registry that holds at most `capacity` vehicles.
    #[must_use]
    pub const fn with_capacity(capacity: usize) -> Self {
        Self {
            vehicles: Vec::new(),
            capacity,
        }
    }

    /// Maximum number of vehicles.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of parked vehicles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    /// Check if no vehicles are parked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    /// Check if the registry is at capacity.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.vehicles.len() >= self.capacity
    }

    /// Add a confirmed vehicle.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::SlotTaken` if the slot already has a vehicle and
    /// `CoreError::RegistryFull` if the registry is at capacity.
    pub fn insert(&mut self, vehicle: ParkedVehicle) -> Result<()> {
        if self.contains(vehicle.slot_id) {
            return Err(CoreError::SlotTaken(vehicle.slot_id));
        }
        if self.is_full() {
            return Err(CoreError::RegistryFull {
                capacity: self.capacity,
            });
        }
        self.vehicles.push(vehicle);
        Ok(())
    }

    /// Get the vehicle parked in a slot.
    #[must_use]
    pub fn get(&self, slot_id: SlotId) -> Option<&ParkedVehicle> {
        self.vehicles.iter().find(|v| v.slot_id == slot_id)
    }

    /// Get a mutable reference to the vehicle parked in a slot.
    pub fn get_mut(&mut self, slot_id: SlotId) -> Option<&mut ParkedVehicle> {
        self.vehicles.iter_mut().find(|v| v.slot_id == slot_id)
    }

    /// Check if a slot has a vehicle.
    #[must_use]
    pub fn contains(&self, slot_id: SlotId) -> bool {
        self.get(slot_id).is_some()
    }

    /// Remove and return the vehicle parked in a slot, keeping the order of
    /// the rest.
    pub fn remove(&mut self, slot_id: SlotId) -> Option<ParkedVehicle> {
        let pos = self.vehicles.iter().position(|v| v.slot_id == slot_id)?;
        Some(self.vehicles.remove(pos))
    }

    /// Iterate over vehicles in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ParkedVehicle> {
        self.vehicles.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn vehicle(slot: u32, plate: &str) -> ParkedVehicle {
        ParkedVehicle {
            plate: plate.to_string(),
            slot_id: SlotId::new(slot).unwrap(),
            user_id: None,
            history_id: Some(format!("h{slot}")),
            check_in_time: String::new(),
            check_out_time: String::new(),
            parked_at: Utc::now(),
        }
    }

    #[test]
    fn insert_and_get() {
        let mut registry = ParkingRegistry::with_capacity(4);
        let slot = SlotId::new(2).unwrap();

        assert!(registry.get(slot).is_none());
        registry.insert(vehicle(2, "AAA")).unwrap();

        assert_eq!(registry.get(slot).unwrap().plate, "AAA");
        assert!(registry.contains(slot));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn one_vehicle_per_slot() {
        let mut registry = ParkingRegistry::with_capacity(4);
        registry.insert(vehicle(1, "AAA")).unwrap();

        let err = registry.insert(vehicle(1, "BBB")).unwrap_err();
        assert!(matches!(err, CoreError::SlotTaken(id) if id.get() == 1));
        assert_eq!(registry.get(SlotId::new(1).unwrap()).unwrap().plate, "AAA");
    }

    #[test]
    fn capacity_is_enforced() {
        let mut registry = ParkingRegistry::with_capacity(2);
        registry.insert(vehicle(1, "A")).unwrap();
        registry.insert(vehicle(2, "B")).unwrap();
        assert!(registry.is_full());

        let err = registry.insert(vehicle(3, "C")).unwrap_err();
        assert!(matches!(err, CoreError::RegistryFull { capacity: 2 }));
    }

    #[test]
    fn remove_keeps_order() {
        let mut registry = ParkingRegistry::with_capacity(4);
        registry.insert(vehicle(3, "C")).unwrap();
        registry.insert(vehicle(1, "A")).unwrap();
        registry.insert(vehicle(2, "B")).unwrap();

        let removed = registry.remove(SlotId::new(1).unwrap()).unwrap();
        assert_eq!(removed.plate, "A");

        let plates: Vec<_> = registry.iter().map(|v| v.plate.as_str()).collect();
        assert_eq!(plates, vec!["C", "B"]);
        assert!(registry.remove(SlotId::new(1).unwrap()).is_none());
    }

    #[test]
    fn get_mut_updates_in_place() {
        let mut registry = ParkingRegistry::with_capacity(1);
        registry.insert(vehicle(1, "A")).unwrap();
        registry.get_mut(SlotId::new(1).unwrap()).unwrap().check_out_time =
            "2024-05-01T11:00:00Z".to_string();
        assert_eq!(
            registry.get(SlotId::new(1).unwrap()).unwrap().check_out_time,
            "2024-05-01T11:00:00Z"
        );
    }
}
