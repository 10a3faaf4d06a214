// NICU Monitor - Neonatal vital-sign telemetry simulation
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Monitor stream configuration.

use crate::error::{MonitorError, Result};
use serde::{Deserialize, Serialize};

/// Live configuration of a monitor stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Wall-clock spacing between ticks (ms).
    pub tick_interval_ms: u64,

    /// Samples retained per channel.
    pub buffer_capacity: usize,

    /// Run samples through the threshold engine.
    pub alerts_enabled: bool,

    /// Minimum spacing between alerts for the same channel and rule (ms).
    pub cooldown_ms: u64,

    /// Clinical event simulation.
    pub simulator: SimulatorConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            buffer_capacity: 300, // 5 minutes at 1 Hz
            alerts_enabled: true,
            cooldown_ms: 30_000,
            simulator: SimulatorConfig::default(),
        }
    }
}

impl MonitorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tick_interval_ms(mut self, interval_ms: u64) -> Self {
        self.tick_interval_ms = interval_ms;
        self
    }

    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }

    pub fn with_alerts_enabled(mut self, enabled: bool) -> Self {
        self.alerts_enabled = enabled;
        self
    }

    pub fn with_cooldown_ms(mut self, cooldown_ms: u64) -> Self {
        self.cooldown_ms = cooldown_ms;
        self
    }

    pub fn with_simulator(mut self, simulator: SimulatorConfig) -> Self {
        self.simulator = simulator;
        self
    }

    /// Reject values that cannot drive a stream. Nothing is clamped.
    pub fn validate(&self) -> Result<()> {
        if self.tick_interval_ms == 0 {
            return Err(MonitorError::InvalidConfig(
                "tick_interval_ms must be positive".to_string(),
            ));
        }
        if self.buffer_capacity == 0 {
            return Err(MonitorError::InvalidCapacity);
        }
        self.simulator.validate()
    }

    /// Copy of this config with `update` applied.
    pub fn merged(&self, update: &ConfigUpdate) -> Self {
        Self {
            tick_interval_ms: update.tick_interval_ms.unwrap_or(self.tick_interval_ms),
            buffer_capacity: update.buffer_capacity.unwrap_or(self.buffer_capacity),
            alerts_enabled: update.alerts_enabled.unwrap_or(self.alerts_enabled),
            cooldown_ms: update.cooldown_ms.unwrap_or(self.cooldown_ms),
            simulator: update
                .simulator
                .clone()
                .unwrap_or_else(|| self.simulator.clone()),
        }
    }

    /// Parse and validate a JSON config. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Tuning of the clinical event simulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Allow new events to start.
    pub enabled: bool,

    /// Chance of an event starting on an idle tick.
    pub event_probability: f64,

    /// Shortest event (ms).
    pub min_event_ms: u64,

    /// Longest event (ms).
    pub max_event_ms: u64,

    /// Length of the recovery window (ms).
    pub recovery_ms: u64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            event_probability: 0.005, // ~1 event per 200 ticks
            min_event_ms: 5_000,
            max_event_ms: 20_000,
            recovery_ms: 10_000,
        }
    }
}

impl SimulatorConfig {
    /// Simulator that never starts events on its own.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.event_probability) {
            return Err(MonitorError::InvalidConfig(format!(
                "event_probability must be within [0, 1], got {}",
                self.event_probability
            )));
        }
        if self.min_event_ms > self.max_event_ms {
            return Err(MonitorError::InvalidConfig(format!(
                "min_event_ms ({}) exceeds max_event_ms ({})",
                self.min_event_ms, self.max_event_ms
            )));
        }
        if self.recovery_ms == 0 {
            return Err(MonitorError::InvalidConfig(
                "recovery_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Partial configuration change. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigUpdate {
    pub tick_interval_ms: Option<u64>,
    pub buffer_capacity: Option<usize>,
    pub alerts_enabled: Option<bool>,
    pub cooldown_ms: Option<u64>,
    pub simulator: Option<SimulatorConfig>,
}

impl ConfigUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tick_interval_ms(mut self, interval_ms: u64) -> Self {
        self.tick_interval_ms = Some(interval_ms);
        self
    }

    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = Some(capacity);
        self
    }

    pub fn with_alerts_enabled(mut self, enabled: bool) -> Self {
        self.alerts_enabled = Some(enabled);
        self
    }

    pub fn with_cooldown_ms(mut self, cooldown_ms: u64) -> Self {
        self.cooldown_ms = Some(cooldown_ms);
        self
    }

    pub fn with_simulator(mut self, simulator: SimulatorConfig) -> Self {
        self.simulator = Some(simulator);
        self
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MonitorConfig::default();
        assert_eq!(config.tick_interval_ms, 1000);
        assert_eq!(config.buffer_capacity, 300);
        assert!(config.alerts_enabled);
        assert_eq!(config.cooldown_ms, 30_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = MonitorConfig::new().with_tick_interval_ms(0);
        assert!(matches!(
            config.validate(),
            Err(MonitorError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = MonitorConfig::new().with_buffer_capacity(0);
        assert_eq!(config.validate(), Err(MonitorError::InvalidCapacity));
    }

    #[test]
    fn test_simulator_validation() {
        let mut sim = SimulatorConfig::default();
        sim.event_probability = 1.5;
        assert!(sim.validate().is_err());

        let mut sim = SimulatorConfig::default();
        sim.min_event_ms = 30_000;
        assert!(sim.validate().is_err());

        let mut sim = SimulatorConfig::default();
        sim.recovery_ms = 0;
        assert!(sim.validate().is_err());
    }

    #[test]
    fn test_merge_partial_update() {
        let config = MonitorConfig::default();
        let update = ConfigUpdate::new()
            .with_cooldown_ms(5_000)
            .with_alerts_enabled(false);
        let merged = config.merged(&update);

        assert_eq!(merged.cooldown_ms, 5_000);
        assert!(!merged.alerts_enabled);
        assert_eq!(merged.tick_interval_ms, config.tick_interval_ms);
        assert_eq!(merged.buffer_capacity, config.buffer_capacity);
    }

    #[test]
    fn test_update_is_empty() {
        assert!(ConfigUpdate::new().is_empty());
        assert!(!ConfigUpdate::new().with_buffer_capacity(10).is_empty());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = MonitorConfig::from_json(r#"{"tick_interval_ms": 250}"#).unwrap();
        assert_eq!(config.tick_interval_ms, 250);
        assert_eq!(config.buffer_capacity, 300);
        assert!(config.simulator.enabled);
    }

    #[test]
    fn test_invalid_json_config_rejected() {
        assert!(MonitorConfig::from_json(r#"{"buffer_capacity": 0}"#).is_err());
        assert!(matches!(
            MonitorConfig::from_json("{"),
            Err(MonitorError::Serialization(_))
        ));
    }

    #[test]
    fn test_config_roundtrip() {
        let config = MonitorConfig::new().with_cooldown_ms(12_000);
        let json = config.to_json().unwrap();
        let parsed = MonitorConfig::from_json(&json).unwrap();
        assert_eq!(config, parsed);
    }
}
