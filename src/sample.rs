// NICU Monitor - Neonatal vital-sign telemetry simulation
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Observations of a single channel.

use crate::channel::VitalChannel;
use serde::{Deserialize, Serialize};

/// Where a sample came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleSource {
    /// Produced by the synthetic monitor.
    #[default]
    Monitor,
    /// Entered by hand.
    Manual,
}

/// One observation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub channel: VitalChannel,
    pub value: f64,
    pub unit: String,
    /// Unix epoch milliseconds.
    pub timestamp_ms: u64,
    pub source: SampleSource,
}

impl Sample {
    /// Create a monitor sample, taking the unit from the channel.
    pub fn new(channel: VitalChannel, value: f64, timestamp_ms: u64) -> Self {
        Self {
            channel,
            value,
            unit: channel.unit().to_string(),
            timestamp_ms,
            source: SampleSource::Monitor,
        }
    }

    /// Create a manually entered sample.
    pub fn manual(channel: VitalChannel, value: f64, timestamp_ms: u64) -> Self {
        Self {
            source: SampleSource::Manual,
            ..Self::new(channel, value, timestamp_ms)
        }
    }

    /// Timestamp as a UTC date-time.
    #[cfg(feature = "timestamps")]
    pub fn recorded_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        chrono::DateTime::from_timestamp_millis(self.timestamp_ms as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_from_channel() {
        let sample = Sample::new(VitalChannel::Temperature, 36.9, 1000);
        assert_eq!(sample.unit, "°C");
        assert_eq!(sample.source, SampleSource::Monitor);
    }

    #[test]
    fn test_manual_sample() {
        let sample = Sample::manual(VitalChannel::HeartRate, 150.0, 2000);
        assert_eq!(sample.source, SampleSource::Manual);
        assert_eq!(sample.unit, "bpm");
        assert_eq!(sample.timestamp_ms, 2000);
    }

    #[cfg(feature = "timestamps")]
    #[test]
    fn test_recorded_at() {
        let sample = Sample::new(VitalChannel::Spo2, 97.0, 1_706_745_600_000);
        let at = sample.recorded_at().unwrap();
        assert_eq!(at.timestamp_millis(), 1_706_745_600_000);
    }
}
