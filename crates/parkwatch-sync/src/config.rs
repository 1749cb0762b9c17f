//! Endpoint configuration for the parking service.

use parkwatch_core::SlotId;
use serde::Deserialize;

use crate::encode::encode_path_segment;

/// Paths of the parking service endpoints, relative to the base URL.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EndpointConfig {
    /// Plate lookup prefix; the encoded plate is appended as a segment.
    #[serde(default = "EndpointConfig::default_lookup_path")]
    pub lookup_path: String,

    /// Check-in endpoint.
    #[serde(default = "EndpointConfig::default_checkin_path")]
    pub checkin_path: String,

    /// Check-out endpoint.
    #[serde(default = "EndpointConfig::default_checkout_path")]
    pub checkout_path: String,

    /// Slot status endpoint; `{id}` is replaced by the slot id.
    #[serde(default = "EndpointConfig::default_slot_status_path")]
    pub slot_status_path: String,

    /// Prefix for the `sensor_id` sent with status advisories.
    #[serde(default = "EndpointConfig::default_sensor_id_prefix")]
    pub sensor_id_prefix: String,
}

impl EndpointConfig {
    fn default_lookup_path() -> String {
        "/api/users/license-plate".to_string()
    }

    fn default_checkin_path() -> String {
        "/api/parking/checkin".to_string()
    }

    fn default_checkout_path() -> String {
        "/api/parking/checkout".to_string()
    }

    fn default_slot_status_path() -> String {
        "/api/slots/{id}/status".to_string()
    }

    fn default_sensor_id_prefix() -> String {
        "PARKWATCH_SLOT_".to_string()
    }

    /// Path for looking up `plate`.
    #[must_use]
    pub fn lookup(&self, plate: &str) -> String {
        format!(
            "{}/{}",
            self.lookup_path.trim_end_matches('/'),
            encode_path_segment(plate)
        )
    }

    /// Path for a slot's status advisory.
    #[must_use]
    pub fn slot_status(&self, slot: SlotId) -> String {
        self.slot_status_path.replace("{id}", &slot.to_string())
    }

    /// Sensor id reported for a slot.
    #[must_use]
    pub fn sensor_id(&self, slot: SlotId) -> String {
        format!("{}{slot}", self.sensor_id_prefix)
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            lookup_path: Self::default_lookup_path(),
            checkin_path: Self::default_checkin_path(),
            checkout_path: Self::default_checkout_path(),
            slot_status_path: Self::default_slot_status_path(),
            sensor_id_prefix: Self::default_sensor_id_prefix(),
        }
    }
}
