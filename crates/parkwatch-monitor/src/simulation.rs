//! Simulated bays and plate readers.
//!
//! These stand in for the ultrasonic sensors, servos, LEDs and camera of a
//! real installation so the monitor can run on any host.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use parkwatch_core::{EchoReading, Occupancy, SlotId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::hardware::{DistanceSensor, PlateSource, SlotActuator};

/// Sensor whose distance is set from outside through a [`SensorHandle`].
#[derive(Debug, Clone)]
pub struct ManualSensor {
    distance_cm: Arc<Mutex<f32>>,
}

/// Controls a [`ManualSensor`].
#[derive(Debug, Clone)]
pub struct SensorHandle {
    distance_cm: Arc<Mutex<f32>>,
}

impl ManualSensor {
    /// Create a sensor reading `distance_cm` until changed.
    #[must_use]
    pub fn new(distance_cm: f32) -> (Self, SensorHandle) {
        let shared = Arc::new(Mutex::new(distance_cm));
        (
            Self {
                distance_cm: Arc::clone(&shared),
            },
            SensorHandle {
                distance_cm: shared,
            },
        )
    }
}

impl SensorHandle {
    /// Place an obstacle `cm` away. Non-positive values mean no echo.
    pub fn set(&self, cm: f32) {
        *self.distance_cm.lock() = cm;
    }
}

impl DistanceSensor for ManualSensor {
    fn measure(&mut self) -> EchoReading {
        EchoReading::for_distance(*self.distance_cm.lock())
    }
}

/// Sensor that replays a fixed sequence of distances, then repeats the last.
#[derive(Debug, Clone)]
pub struct ScriptedSensor {
    readings: VecDeque<f32>,
    last: Option<f32>,
}

impl ScriptedSensor {
    /// Create a sensor from distances in centimetres.
    #[must_use]
    pub fn new(readings: impl IntoIterator<Item = f32>) -> Self {
        Self {
            readings: readings.into_iter().collect(),
            last: None,
        }
    }
}

impl DistanceSensor for ScriptedSensor {
    fn measure(&mut self) -> EchoReading {
        if let Some(next) = self.readings.pop_front() {
            self.last = Some(next);
        }
        self.last.map_or(EchoReading::NoEcho, EchoReading::for_distance)
    }
}

/// Sensor that simulates cars arriving and leaving at random.
#[derive(Debug)]
pub struct TrafficSensor {
    rng: StdRng,
    arrive_chance: f64,
    leave_chance: f64,
    parked: bool,
}

impl TrafficSensor {
    /// Create a sensor where a car arrives at an empty bay with probability
    /// `arrive_chance` per measurement and leaves with `leave_chance`.
    #[must_use]
    pub fn new(arrive_chance: f64, leave_chance: f64) -> Self {
        Self::with_rng(StdRng::from_os_rng(), arrive_chance, leave_chance)
    }

    /// Like [`new`](Self::new) but reproducible.
    #[must_use]
    pub fn with_seed(seed: u64, arrive_chance: f64, leave_chance: f64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), arrive_chance, leave_chance)
    }

    fn with_rng(rng: StdRng, arrive_chance: f64, leave_chance: f64) -> Self {
        Self {
            rng,
            arrive_chance: arrive_chance.clamp(0.0, 1.0),
            leave_chance: leave_chance.clamp(0.0, 1.0),
            parked: false,
        }
    }
}

impl DistanceSensor for TrafficSensor {
    fn measure(&mut self) -> EchoReading {
        let flip = if self.parked {
            self.leave_chance
        } else {
            self.arrive_chance
        };
        if self.rng.random_bool(flip) {
            self.parked = !self.parked;
        }

        if self.parked {
            EchoReading::for_distance(self.rng.random_range(3.0..9.0))
        } else if self.rng.random_bool(0.1) {
            EchoReading::NoEcho
        } else {
            EchoReading::for_distance(self.rng.random_range(20.0..300.0))
        }
    }
}

/// Something an actuator was told to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorEvent {
    /// Barrier raised.
    Opened,
    /// Barrier lowered.
    Closed,
    /// Indicator changed.
    Indicated(Occupancy),
}

/// Actuator that logs every command and keeps a history.
#[derive(Debug, Clone)]
pub struct SimulatedActuator {
    slot: SlotId,
    events: Arc<Mutex<Vec<ActuatorEvent>>>,
}

/// Read access to a [`SimulatedActuator`]'s history.
#[derive(Debug, Clone)]
pub struct ActuatorLog {
    events: Arc<Mutex<Vec<ActuatorEvent>>>,
}

impl SimulatedActuator {
    /// Create an actuator for `slot`.
    #[must_use]
    pub fn new(slot: SlotId) -> (Self, ActuatorLog) {
        let events = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                slot,
                events: Arc::clone(&events),
            },
            ActuatorLog { events },
        )
    }

    fn record(&self, event: ActuatorEvent) {
        self.events.lock().push(event);
    }
}

impl SlotActuator for SimulatedActuator {
    fn open(&mut self) {
        info!(slot = %self.slot, "barrier open");
        self.record(ActuatorEvent::Opened);
    }

    fn close(&mut self) {
        debug!(slot = %self.slot, "barrier close");
        self.record(ActuatorEvent::Closed);
    }

    fn indicate(&mut self, occupancy: Occupancy) {
        let colour = if occupancy.is_occupied() { "red" } else { "green" };
        debug!(slot = %self.slot, colour, "indicator");
        self.record(ActuatorEvent::Indicated(occupancy));
    }
}

impl ActuatorLog {
    /// All events so far.
    #[must_use]
    pub fn events(&self) -> Vec<ActuatorEvent> {
        self.events.lock().clone()
    }

    /// The most recent event.
    #[must_use]
    pub fn last(&self) -> Option<ActuatorEvent> {
        self.events.lock().last().copied()
    }

    /// Forget recorded events.
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

/// Plates registered with the demo backend.
pub const DEMO_PLATES: &[&str] = &["51D-22222", "51D-22223", "51A-12345", "29B-67890", "99A-99999"];

/// Plate reader that mostly returns known plates and sometimes a random one.
#[derive(Debug)]
pub struct DemoPlates {
    rng: StdRng,
    known: Vec<String>,
    known_chance: f64,
}

impl DemoPlates {
    /// Draw from [`DEMO_PLATES`] 70% of the time.
    #[must_use]
    pub fn new() -> Self {
        Self::with_known(DEMO_PLATES.iter().map(ToString::to_string), 0.7)
    }

    /// Draw from `known` with probability `known_chance`.
    #[must_use]
    pub fn with_known(known: impl IntoIterator<Item = String>, known_chance: f64) -> Self {
        Self {
            rng: StdRng::from_os_rng(),
            known: known.into_iter().collect(),
            known_chance: known_chance.clamp(0.0, 1.0),
        }
    }

    fn random_plate(&mut self) -> String {
        let prefix: u8 = self.rng.random_range(11..100);
        let series = char::from(b'A' + self.rng.random_range(0..26u8));
        let serial: u32 = self.rng.random_range(1..100_000);
        format!("{prefix:02}{series}-{serial:05}")
    }
}

impl Default for DemoPlates {
    fn default() -> Self {
        Self::new()
    }
}

impl PlateSource for DemoPlates {
    fn next_plate(&mut self, slot: SlotId) -> String {
        let plate = if !self.known.is_empty() && self.rng.random_bool(self.known_chance) {
            let idx = self.rng.random_range(0..self.known.len());
            self.known[idx].clone()
        } else {
            self.random_plate()
        };
        debug!(slot = %slot, plate = %plate, "plate read");
        plate
    }
}

/// Plate reader that cycles through a fixed list.
#[derive(Debug, Clone)]
pub struct FixedPlates {
    plates: Vec<String>,
    next: usize,
}

impl FixedPlates {
    /// Cycle through `plates`. An empty list yields `"UNKNOWN"`.
    #[must_use]
    pub fn new(plates: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            plates: plates.into_iter().map(Into::into).collect(),
            next: 0,
        }
    }
}

impl PlateSource for FixedPlates {
    fn next_plate(&mut self, _slot: SlotId) -> String {
        if self.plates.is_empty() {
            return "UNKNOWN".to_string();
        }
        let plate = self.plates[self.next % self.plates.len()].clone();
        self.next += 1;
        plate
    }
}
