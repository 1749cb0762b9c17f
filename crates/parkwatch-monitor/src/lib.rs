//! Slot monitoring and orchestration for parkwatch.
//!
//! The [`ParkingMonitor`] owns one [`Bay`] of hardware per slot and, on every
//! tick, turns distance readings into check-ins and check-outs against the
//! parking service.
//!
//! ```text
//!   DistanceSensor ──▶ sampler ──▶ hysteresis ──▶ arrival / departure
//!                                                   │
//!                 PlateSource ──▶ ResolverClient ───┤
//!                                                   ▼
//!                                    Coordinator (check-in / check-out)
//!                                                   │
//!                   SlotActuator ◀── barrier timer ◀┘
//! ```
//!
//! The [`simulation`] module provides software bays so the monitor runs
//! without hardware.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod hardware;
pub mod monitor;
pub mod simulation;
pub mod status;

pub use config::MonitorConfig;
pub use error::{MonitorError, Result};
pub use hardware::{Bay, DistanceSensor, PlateSource, SlotActuator};
pub use monitor::{ParkingMonitor, SlotEvent};
