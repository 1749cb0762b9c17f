//! Monitor configuration.

use std::str::FromStr;
use std::time::Duration;

use parkwatch_auth::ApiConfig;
use parkwatch_core::SensingConfig;
use parkwatch_sync::EndpointConfig;
use serde::Deserialize;
use tracing::warn;

use crate::error::{MonitorError, Result};

/// Everything the monitor binary needs.
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    /// Number of slots, numbered from 1.
    #[serde(default = "MonitorConfig::default_slots")]
    pub slots: usize,

    /// Vehicles that may be checked in at once. Defaults to `slots`.
    #[serde(default)]
    pub capacity: Option<usize>,

    /// Tick period in milliseconds.
    #[serde(default = "MonitorConfig::default_tick_interval")]
    pub tick_interval_ms: u64,

    /// Plate to resolve once at startup. Empty disables the self-test.
    #[serde(default)]
    pub self_test_plate: Option<String>,

    /// Per-measurement chance that a car arrives at an empty simulated bay.
    #[serde(default = "MonitorConfig::default_arrive_chance")]
    pub arrive_chance: f64,

    /// Per-measurement chance that a parked simulated car leaves.
    #[serde(default = "MonitorConfig::default_leave_chance")]
    pub leave_chance: f64,

    /// Sensing thresholds and barrier timing.
    #[serde(default)]
    pub sensing: SensingConfig,

    /// Service connection and credentials.
    #[serde(default)]
    pub api: ApiConfig,

    /// Service endpoint paths.
    #[serde(default)]
    pub endpoints: EndpointConfig,
}

impl MonitorConfig {
    const fn default_slots() -> usize {
        4
    }

    const fn default_tick_interval() -> u64 {
        5000
    }

    const fn default_arrive_chance() -> f64 {
        0.2
    }

    const fn default_leave_chance() -> f64 {
        0.1
    }

    /// Get the tick period as a `Duration`.
    #[must_use]
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Load configuration from environment variables.
    ///
    /// Supported environment variables:
    /// - `PARKWATCH_SLOTS`: Number of slots
    /// - `PARKWATCH_CAPACITY`: Vehicles checked in at once
    /// - `PARKWATCH_TICK_MS`: Tick period in milliseconds
    /// - `PARKWATCH_SELF_TEST_PLATE`: Plate to resolve at startup
    /// - `PARKWATCH_ARRIVE_CHANCE` / `PARKWATCH_LEAVE_CHANCE`: Simulated traffic
    /// - `PARKWATCH_OCCUPY_CM` / `PARKWATCH_FREE_CM`: Hysteresis thresholds
    /// - `PARKWATCH_MAX_DISTANCE_CM`: Sensor range
    /// - `PARKWATCH_OPEN_MS`: Barrier open duration
    /// - `PARKWATCH_API_URL`: Service base URL
    /// - `PARKWATCH_EMAIL` / `PARKWATCH_PASSWORD`: Device credentials
    /// - `PARKWATCH_REQUEST_TIMEOUT_SECS` / `PARKWATCH_CONNECT_TIMEOUT_SECS`
    /// - `PARKWATCH_MAX_AUTH_RETRIES`: Re-logins allowed per request
    /// - `PARKWATCH_SENSOR_PREFIX`: Prefix of advisory sensor ids
    ///
    /// Unparsable numbers are ignored with a warning.
    ///
    /// # Errors
    ///
    /// Returns `MonitorError::Config` if the resulting configuration is
    /// invalid.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`from_env`](Self::from_env) with a custom variable source.
    ///
    /// # Errors
    ///
    /// Returns `MonitorError::Config` if the resulting configuration is
    /// invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        let text = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        set_parsed(&lookup, "PARKWATCH_SLOTS", &mut config.slots);
        set_parsed(&lookup, "PARKWATCH_TICK_MS", &mut config.tick_interval_ms);
        set_parsed(&lookup, "PARKWATCH_ARRIVE_CHANCE", &mut config.arrive_chance);
        set_parsed(&lookup, "PARKWATCH_LEAVE_CHANCE", &mut config.leave_chance);
        config.self_test_plate = text("PARKWATCH_SELF_TEST_PLATE");
        if let Some(raw) = text("PARKWATCH_CAPACITY") {
            match raw.trim().parse() {
                Ok(capacity) => config.capacity = Some(capacity),
                Err(e) => {
                    warn!(var = "PARKWATCH_CAPACITY", value = %raw, error = %e, "ignoring unparsable setting");
                }
            }
        }

        let sensing = &mut config.sensing;
        set_parsed(&lookup, "PARKWATCH_OCCUPY_CM", &mut sensing.occupy_threshold_cm);
        set_parsed(&lookup, "PARKWATCH_FREE_CM", &mut sensing.free_threshold_cm);
        set_parsed(&lookup, "PARKWATCH_MAX_DISTANCE_CM", &mut sensing.max_distance_cm);
        set_parsed(&lookup, "PARKWATCH_OPEN_MS", &mut sensing.open_duration_ms);

        let api = &mut config.api;
        if let Some(val) = text("PARKWATCH_API_URL") {
            api.base_url = val;
        }
        if let Some(val) = text("PARKWATCH_EMAIL") {
            api.email = val;
        }
        if let Some(val) = lookup("PARKWATCH_PASSWORD") {
            api.password = val;
        }
        set_parsed(&lookup, "PARKWATCH_REQUEST_TIMEOUT_SECS", &mut api.request_timeout_secs);
        set_parsed(&lookup, "PARKWATCH_CONNECT_TIMEOUT_SECS", &mut api.connect_timeout_secs);
        set_parsed(&lookup, "PARKWATCH_MAX_AUTH_RETRIES", &mut api.max_auth_retries);

        if let Some(val) = text("PARKWATCH_SENSOR_PREFIX") {
            config.endpoints.sensor_id_prefix = val;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the configuration.
    ///
    /// # Errors
    ///
    /// Returns `MonitorError::Config` naming the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        if self.slots == 0 {
            return Err(MonitorError::Config("slots must be at least 1".to_string()));
        }
        if let Some(capacity) = self.capacity {
            if capacity == 0 || capacity > self.slots {
                return Err(MonitorError::Config(format!(
                    "capacity must be within 1..={}, got {capacity}",
                    self.slots
                )));
            }
        }
        if self.tick_interval_ms == 0 {
            return Err(MonitorError::Config(
                "tick interval must be positive".to_string(),
            ));
        }
        for (name, chance) in [
            ("arrive_chance", self.arrive_chance),
            ("leave_chance", self.leave_chance),
        ] {
            if !(0.0..=1.0).contains(&chance) {
                return Err(MonitorError::Config(format!(
                    "{name} must be within 0..=1, got {chance}"
                )));
            }
        }
        if self.api.base_url.trim().is_empty() {
            return Err(MonitorError::Config("API base URL is empty".to_string()));
        }
        self.sensing.validate()?;
        Ok(())
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            slots: Self::default_slots(),
            capacity: None,
            tick_interval_ms: Self::default_tick_interval(),
            self_test_plate: None,
            arrive_chance: Self::default_arrive_chance(),
            leave_chance: Self::default_leave_chance(),
            sensing: SensingConfig::default(),
            api: ApiConfig::default(),
            endpoints: EndpointConfig::default(),
        }
    }
}

fn set_parsed<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str, target: &mut T)
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(raw) = lookup(name) else {
        return;
    };
    match raw.trim().parse() {
        Ok(value) => *target = value,
        Err(e) => warn!(var = name, value = %raw, error = %e, "ignoring unparsable setting"),
    }
}
