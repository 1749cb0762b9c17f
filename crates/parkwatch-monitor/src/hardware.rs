//! Hardware collaborators of a parking bay.
//!
//! Each bay pairs one distance sensor with one actuator (barrier plus
//! indicator). Implementations must tolerate repeated commands.

use parkwatch_core::{ActuatorCommand, EchoReading, Occupancy, SlotId};

/// An ultrasonic distance sensor.
pub trait DistanceSensor: Send {
    /// Trigger one measurement.
    fn measure(&mut self) -> EchoReading;
}

/// A barrier with a two-colour occupancy indicator.
pub trait SlotActuator: Send {
    /// Raise the barrier.
    fn open(&mut self);

    /// Lower the barrier.
    fn close(&mut self);

    /// Show the occupancy (green for free, red for occupied).
    fn indicate(&mut self, occupancy: Occupancy);

    /// Execute a state machine command.
    fn apply(&mut self, command: ActuatorCommand) {
        match command {
            ActuatorCommand::Open => self.open(),
            ActuatorCommand::Close => self.close(),
        }
    }
}

/// Identifies the vehicle that just pulled into a slot.
pub trait PlateSource: Send {
    /// Read the plate of the vehicle in `slot`.
    fn next_plate(&mut self, slot: SlotId) -> String;
}

/// The hardware of one slot.
pub struct Bay {
    /// Presence sensor.
    pub sensor: Box<dyn DistanceSensor>,
    /// Barrier and indicator.
    pub actuator: Box<dyn SlotActuator>,
}

impl Bay {
    /// Pair a sensor with an actuator.
    #[must_use]
    pub fn new(
        sensor: impl DistanceSensor + 'static,
        actuator: impl SlotActuator + 'static,
    ) -> Self {
        Self {
            sensor: Box::new(sensor),
            actuator: Box::new(actuator),
        }
    }
}

impl std::fmt::Debug for Bay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bay").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        opened: u32,
        closed: u32,
    }

    impl SlotActuator for Counter {
        fn open(&mut self) {
            self.opened += 1;
        }

        fn close(&mut self) {
            self.closed += 1;
        }

        fn indicate(&mut self, _occupancy: Occupancy) {}
    }

    #[test]
    fn apply_dispatches_commands() {
        let mut actuator = Counter::default();
        actuator.apply(ActuatorCommand::Open);
        actuator.apply(ActuatorCommand::Close);
        actuator.apply(ActuatorCommand::Close);
        assert_eq!((actuator.opened, actuator.closed), (1, 2));
    }
}
