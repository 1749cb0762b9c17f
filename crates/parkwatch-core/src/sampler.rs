//! Time-of-flight distance sampling.
//!
//! Converts an ultrasonic echo pulse width into centimetres. Anything the
//! sensor cannot vouch for (no echo, a zero-length pulse, a reading beyond
//! the rated range) becomes the max-range sentinel, which the debouncer reads
//! as "free".

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::SensingConfig;

/// Round-trip speed of sound in cm per microsecond (343 m/s).
pub const SPEED_OF_SOUND_CM_PER_US: f32 = 0.034;

/// Longest pulse a sensor waits for before reporting no echo (~510 cm).
pub const ECHO_TIMEOUT: Duration = Duration::from_millis(30);

/// A raw reading from a distance sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EchoReading {
    /// The echo pin stayed high for this long.
    Echo(Duration),
    /// The sensor timed out waiting for an echo.
    NoEcho,
}

impl EchoReading {
    /// Build the echo a sensor would report for an obstacle `cm` away.
    ///
    /// Used by simulated sensors. Obstacles past [`ECHO_TIMEOUT`] yield
    /// [`EchoReading::NoEcho`].
    #[must_use]
    pub fn for_distance(cm: f32) -> Self {
        if !cm.is_finite() || cm <= 0.0 {
            return Self::NoEcho;
        }
        match Duration::try_from_secs_f32(cm * 2.0 / SPEED_OF_SOUND_CM_PER_US / 1e6) {
            Ok(pulse) if pulse <= ECHO_TIMEOUT => Self::Echo(pulse),
            _ => Self::NoEcho,
        }
    }
}

/// Converts echo readings into calibrated, clamped distances.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceSampler {
    max_distance_cm: f32,
}

impl DistanceSampler {
    /// Create a sampler with the given max range in centimetres.
    #[must_use]
    pub const fn new(max_distance_cm: f32) -> Self {
        Self { max_distance_cm }
    }

    /// Create a sampler from the sensing configuration.
    #[must_use]
    pub const fn from_config(config: &SensingConfig) -> Self {
        Self::new(config.max_distance_cm)
    }

    /// The max-range sentinel.
    #[must_use]
    pub const fn max_distance_cm(&self) -> f32 {
        self.max_distance_cm
    }

    /// Convert a reading to centimetres.
    #[must_use]
    pub fn calibrate(&self, reading: EchoReading) -> f32 {
        match reading {
            EchoReading::NoEcho => self.max_distance_cm,
            EchoReading::Echo(pulse) => {
                let micros = pulse.as_secs_f32() * 1e6;
                self.clamp(micros * SPEED_OF_SOUND_CM_PER_US / 2.0)
            }
        }
    }

    /// Clamp an already-converted distance into the valid range.
    #[must_use]
    pub fn clamp(&self, cm: f32) -> f32 {
        if !cm.is_finite() || cm <= 0.0 || cm > self.max_distance_cm {
            self.max_distance_cm
        } else {
            cm
        }
    }
}

impl Default for DistanceSampler {
    fn default() -> Self {
        Self::from_config(&SensingConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 0.05
    }

    #[test]
    fn converts_pulse_width() {
        let sampler = DistanceSampler::default();
        // 588us round trip is ~10cm
        let cm = sampler.calibrate(EchoReading::Echo(Duration::from_micros(588)));
        assert!(close(cm, 10.0), "got {cm}");
    }

    #[test]
    fn no_echo_is_max_range() {
        let sampler = DistanceSampler::new(400.0);
        assert!(close(sampler.calibrate(EchoReading::NoEcho), 400.0));
    }

    #[test]
    fn zero_pulse_is_max_range() {
        let sampler = DistanceSampler::new(400.0);
        assert!(close(
            sampler.calibrate(EchoReading::Echo(Duration::ZERO)),
            400.0
        ));
    }

    #[test]
    fn beyond_range_is_clamped() {
        let sampler = DistanceSampler::new(400.0);
        // 30ms timeout window is ~510cm
        let cm = sampler.calibrate(EchoReading::Echo(Duration::from_millis(30)));
        assert!(close(cm, 400.0));
        assert!(close(sampler.clamp(f32::NAN), 400.0));
        assert!(close(sampler.clamp(-3.0), 400.0));
    }

    #[test]
    fn simulated_echo_matches_distance() {
        let sampler = DistanceSampler::default();
        for cm in [5.0, 12.5, 120.0] {
            let got = sampler.calibrate(EchoReading::for_distance(cm));
            assert!(close(got, cm), "{cm} -> {got}");
        }
        assert_eq!(EchoReading::for_distance(0.0), EchoReading::NoEcho);
    }

    #[test]
    fn simulated_echo_past_timeout_is_no_echo() {
        assert_eq!(EchoReading::for_distance(f32::MAX), EchoReading::NoEcho);
        assert_eq!(EchoReading::for_distance(600.0), EchoReading::NoEcho);
        assert!(matches!(EchoReading::for_distance(500.0), EchoReading::Echo(_)));

        let sampler = DistanceSampler::new(400.0);
        assert!(close(sampler.calibrate(EchoReading::for_distance(f32::MAX)), 400.0));
    }
}
