// NICU Monitor - Neonatal vital-sign telemetry simulation
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Physiological channel catalogue.
//!
//! Each channel carries a unit, a baseline distribution and the range of
//! physically plausible values. Baselines are tuned for a term neonate.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One monitored physiological signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VitalChannel {
    HeartRate,
    Spo2,
    RespiratoryRate,
    Temperature,
    SystolicBp,
    DiastolicBp,
}

impl VitalChannel {
    /// All channels, in generation order.
    pub const ALL: [VitalChannel; 6] = [
        VitalChannel::HeartRate,
        VitalChannel::Spo2,
        VitalChannel::RespiratoryRate,
        VitalChannel::Temperature,
        VitalChannel::SystolicBp,
        VitalChannel::DiastolicBp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VitalChannel::HeartRate => "heart_rate",
            VitalChannel::Spo2 => "spo2",
            VitalChannel::RespiratoryRate => "respiratory_rate",
            VitalChannel::Temperature => "temperature",
            VitalChannel::SystolicBp => "systolic_bp",
            VitalChannel::DiastolicBp => "diastolic_bp",
        }
    }

    /// Human-readable label used in alert messages.
    pub fn label(&self) -> &'static str {
        match self {
            VitalChannel::HeartRate => "Heart rate",
            VitalChannel::Spo2 => "SpO2",
            VitalChannel::RespiratoryRate => "Respiratory rate",
            VitalChannel::Temperature => "Temperature",
            VitalChannel::SystolicBp => "Systolic pressure",
            VitalChannel::DiastolicBp => "Diastolic pressure",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            VitalChannel::HeartRate => "bpm",
            VitalChannel::Spo2 => "%",
            VitalChannel::RespiratoryRate => "/min",
            VitalChannel::Temperature => "°C",
            VitalChannel::SystolicBp | VitalChannel::DiastolicBp => "mmHg",
        }
    }

    /// Baseline distribution and plausible bounds.
    pub fn profile(&self) -> ChannelProfile {
        match self {
            VitalChannel::HeartRate => ChannelProfile::new(145.0, 8.0, 30.0, 250.0),
            VitalChannel::Spo2 => ChannelProfile::new(95.5, 1.2, 40.0, 100.0),
            VitalChannel::RespiratoryRate => ChannelProfile::new(45.0, 5.0, 0.0, 120.0),
            VitalChannel::Temperature => ChannelProfile::new(36.8, 0.15, 32.0, 41.0),
            VitalChannel::SystolicBp => ChannelProfile::new(65.0, 4.0, 20.0, 140.0),
            VitalChannel::DiastolicBp => ChannelProfile::new(40.0, 3.0, 10.0, 100.0),
        }
    }
}

impl fmt::Display for VitalChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Baseline distribution of a channel plus its plausible range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelProfile {
    /// Baseline mean.
    pub mean: f64,
    /// Baseline standard deviation.
    pub std_dev: f64,
    /// Lowest physically plausible value.
    pub min: f64,
    /// Highest physically plausible value.
    pub max: f64,
}

impl ChannelProfile {
    /// Width of the normal band in standard deviations on each side of the mean.
    pub const NORMAL_BAND_SIGMAS: f64 = 3.0;

    pub const fn new(mean: f64, std_dev: f64, min: f64, max: f64) -> Self {
        Self {
            mean,
            std_dev,
            min,
            max,
        }
    }

    /// `(low, high)` of the normal band.
    pub fn normal_band(&self) -> (f64, f64) {
        let half = self.std_dev * Self::NORMAL_BAND_SIGMAS;
        (self.mean - half, self.mean + half)
    }

    /// Clamp to the plausible range.
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_band_inside_plausible_range() {
        for channel in VitalChannel::ALL {
            let profile = channel.profile();
            let (low, high) = profile.normal_band();
            assert!(low >= profile.min, "{} band below min", channel);
            assert!(high <= profile.max, "{} band above max", channel);
        }
    }

    #[test]
    fn test_clamp() {
        let profile = VitalChannel::Spo2.profile();
        assert_eq!(profile.clamp(104.0), 100.0);
        assert_eq!(profile.clamp(12.0), 40.0);
        assert_eq!(profile.clamp(93.0), 93.0);
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&VitalChannel::HeartRate).unwrap();
        assert_eq!(json, "\"heart_rate\"");
        let parsed: VitalChannel = serde_json::from_str("\"systolic_bp\"").unwrap();
        assert_eq!(parsed, VitalChannel::SystolicBp);
    }
}
