//! Core types and state machines for parkwatch.
//!
//! This crate holds everything that does not touch the network:
//!
//! - **Identifiers**: [`SlotId`], 1-based
//! - **Sensing**: the [`DistanceSampler`] and the [`Hysteresis`] debouncer
//! - **Actuation**: the barrier state machine in [`actuator`]
//! - **Registry**: the [`ParkingRegistry`] of confirmed vehicles
//! - **Documents**: path-queryable JSON via [`Document`] and [`FieldPath`]
//!
//! # Example
//!
//! ```
//! use parkwatch_core::{Hysteresis, Occupancy, SensingConfig};
//!
//! let filter = Hysteresis::from_config(&SensingConfig::default()).unwrap();
//! let mut state = Occupancy::Free;
//! for distance in [20.0, 8.0, 12.0, 16.0] {
//!     state = filter.next(state, distance);
//! }
//! assert_eq!(state, Occupancy::Free);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod actuator;
pub mod config;
pub mod document;
pub mod error;
pub mod ids;
pub mod occupancy;
pub mod registry;
pub mod sampler;
pub mod types;

pub use actuator::{ActuatorCommand, ActuatorState, BarrierTimer};
pub use config::SensingConfig;
pub use document::{Document, DocumentError, FieldKind, FieldPath};
pub use error::{CoreError, Result};
pub use ids::{IdError, SlotId};
pub use occupancy::{Hysteresis, Occupancy, Transition};
pub use registry::ParkingRegistry;
pub use sampler::{DistanceSampler, EchoReading};
pub use types::{ParkedVehicle, Slot};
