//! Synchronization with the parking service.
//!
//! - [`ResolverClient`] maps a license plate to a user id
//! - [`Coordinator`] performs check-in, check-out and slot advisories
//! - [`reconcile`] decides which user id to keep after a check-in
//!
//! Every response field is read through ordered [`FieldPath`] candidate
//! lists, since the server has used several envelope shapes over time.
//!
//! [`FieldPath`]: parkwatch_core::FieldPath

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod coordinator;
pub mod encode;
pub mod error;
pub mod reconcile;
pub mod resolver;

pub use config::EndpointConfig;
pub use coordinator::{CheckInReceipt, CheckOutReceipt, Coordinator};
pub use encode::encode_path_segment;
pub use error::{Result, SyncError};
pub use reconcile::{reconcile, ReconcileOutcome, Reconciliation};
pub use resolver::{PlateLookup, ResolverClient};
