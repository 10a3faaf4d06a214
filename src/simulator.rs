// NICU Monitor - Neonatal vital-sign telemetry simulation
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Clinical event simulator.
//!
//! A small state machine that occasionally drives one channel into an
//! abnormal range (bradycardia or desaturation), then walks it back to
//! baseline over a fixed recovery window.
//!
//! ```text
//!   Idle ──(p per tick)──▶ Active ──(duration)──▶ Recovering ──(window)──▶ Idle
//! ```
//!
//! A new event can only start from `Idle`, so a recovery window always
//! runs to completion before the next event.

use crate::channel::VitalChannel;
use crate::config::SimulatorConfig;
use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Kind of synthetic clinical event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClinicalEventKind {
    Bradycardia,
    Desaturation,
}

impl ClinicalEventKind {
    pub const ALL: [ClinicalEventKind; 2] =
        [ClinicalEventKind::Bradycardia, ClinicalEventKind::Desaturation];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClinicalEventKind::Bradycardia => "BRADYCARDIA",
            ClinicalEventKind::Desaturation => "DESATURATION",
        }
    }

    /// The only channel this event affects.
    pub fn channel(&self) -> VitalChannel {
        match self {
            ClinicalEventKind::Bradycardia => VitalChannel::HeartRate,
            ClinicalEventKind::Desaturation => VitalChannel::Spo2,
        }
    }

    /// Half-open `[floor, ceiling)` range drawn from while active.
    pub fn abnormal_band(&self) -> (f64, f64) {
        match self {
            ClinicalEventKind::Bradycardia => (60.0, 80.0),
            ClinicalEventKind::Desaturation => (70.0, 85.0),
        }
    }
}

/// Current phase of the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EventPhase {
    #[default]
    Idle,
    Active {
        kind: ClinicalEventKind,
        started_ms: u64,
        duration_ms: u64,
    },
    Recovering {
        kind: ClinicalEventKind,
        recovery_started_ms: u64,
    },
}

impl EventPhase {
    pub fn kind(&self) -> Option<ClinicalEventKind> {
        match self {
            EventPhase::Idle => None,
            EventPhase::Active { kind, .. } | EventPhase::Recovering { kind, .. } => Some(*kind),
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, EventPhase::Idle)
    }
}

/// Stochastic clinical event state machine.
#[derive(Debug, Clone)]
pub struct ClinicalEventSimulator {
    config: SimulatorConfig,
    phase: EventPhase,
}

impl ClinicalEventSimulator {
    pub fn new(config: SimulatorConfig) -> Self {
        Self {
            config,
            phase: EventPhase::Idle,
        }
    }

    /// Advance the state machine to `now_ms`. Call once per tick, before
    /// generating values.
    pub fn advance(&mut self, now_ms: u64, rng: &mut (impl Rng + ?Sized)) -> EventPhase {
        self.phase = match self.phase {
            EventPhase::Idle => {
                if self.config.enabled && rng.gen::<f64>() < self.config.event_probability {
                    let kind = ClinicalEventKind::ALL[rng.gen_range(0..ClinicalEventKind::ALL.len())];
                    let duration_ms =
                        rng.gen_range(self.config.min_event_ms..=self.config.max_event_ms);
                    debug!(
                        "Clinical event {} started, lasting {}ms",
                        kind.as_str(),
                        duration_ms
                    );
                    EventPhase::Active {
                        kind,
                        started_ms: now_ms,
                        duration_ms,
                    }
                } else {
                    EventPhase::Idle
                }
            }
            EventPhase::Active {
                kind,
                started_ms,
                duration_ms,
            } => {
                if now_ms.saturating_sub(started_ms) >= duration_ms {
                    debug!("Clinical event {} recovering", kind.as_str());
                    EventPhase::Recovering {
                        kind,
                        recovery_started_ms: now_ms,
                    }
                } else {
                    self.phase
                }
            }
            EventPhase::Recovering {
                kind,
                recovery_started_ms,
            } => {
                if now_ms.saturating_sub(recovery_started_ms) >= self.config.recovery_ms {
                    debug!("Clinical event {} resolved", kind.as_str());
                    EventPhase::Idle
                } else {
                    self.phase
                }
            }
        };
        self.phase
    }

    /// Value that replaces normal generation for `channel`, if an event
    /// currently implicates it.
    pub fn override_value(
        &self,
        channel: VitalChannel,
        now_ms: u64,
        rng: &mut (impl Rng + ?Sized),
    ) -> Option<f64> {
        match self.phase {
            EventPhase::Active { kind, .. } if kind.channel() == channel => {
                let (floor, ceiling) = kind.abnormal_band();
                Some(rng.gen_range(floor..ceiling))
            }
            EventPhase::Recovering {
                kind,
                recovery_started_ms,
            } if kind.channel() == channel => {
                let (floor, _) = kind.abnormal_band();
                let elapsed = now_ms.saturating_sub(recovery_started_ms) as f64;
                let fraction = (elapsed / self.config.recovery_ms as f64).clamp(0.0, 1.0);
                Some(floor + (channel.profile().mean - floor) * fraction)
            }
            _ => None,
        }
    }

    /// Start an event immediately. Returns false unless idle.
    pub fn trigger(&mut self, kind: ClinicalEventKind, now_ms: u64, duration_ms: u64) -> bool {
        if !self.phase.is_idle() {
            return false;
        }
        debug!("Clinical event {} triggered manually", kind.as_str());
        self.phase = EventPhase::Active {
            kind,
            started_ms: now_ms,
            duration_ms,
        };
        true
    }

    pub fn phase(&self) -> EventPhase {
        self.phase
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Replace tuning. An event in progress runs to completion.
    pub fn set_config(&mut self, config: SimulatorConfig) {
        self.config = config;
    }

    pub fn reset(&mut self) {
        self.phase = EventPhase::Idle;
    }
}

impl Default for ClinicalEventSimulator {
    fn default() -> Self {
        Self::new(SimulatorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn always_fire() -> SimulatorConfig {
        SimulatorConfig {
            enabled: true,
            event_probability: 1.0,
            min_event_ms: 5_000,
            max_event_ms: 5_000,
            recovery_ms: 10_000,
        }
    }

    #[test]
    fn test_idle_when_disabled() {
        let mut sim = ClinicalEventSimulator::new(SimulatorConfig {
            event_probability: 1.0,
            ..SimulatorConfig::disabled()
        });
        let mut rng = StdRng::seed_from_u64(1);
        for t in 0..100 {
            assert!(sim.advance(t * 1000, &mut rng).is_idle());
        }
    }

    #[test]
    fn test_full_lifecycle() {
        let mut sim = ClinicalEventSimulator::new(always_fire());
        let mut rng = StdRng::seed_from_u64(7);

        let phase = sim.advance(0, &mut rng);
        let kind = phase.kind().unwrap();
        assert!(matches!(phase, EventPhase::Active { duration_ms: 5_000, .. }));

        assert!(matches!(sim.advance(4_000, &mut rng), EventPhase::Active { .. }));
        assert_eq!(
            sim.advance(5_000, &mut rng),
            EventPhase::Recovering {
                kind,
                recovery_started_ms: 5_000
            }
        );
        assert!(matches!(
            sim.advance(14_000, &mut rng),
            EventPhase::Recovering { .. }
        ));
        assert!(sim.advance(15_000, &mut rng).is_idle());
    }

    #[test]
    fn test_no_new_event_during_recovery() {
        let mut sim = ClinicalEventSimulator::new(always_fire());
        let mut rng = StdRng::seed_from_u64(3);
        sim.advance(0, &mut rng);
        sim.advance(5_000, &mut rng);

        for t in 6..15 {
            let phase = sim.advance(t * 1000, &mut rng);
            assert!(matches!(phase, EventPhase::Recovering { .. }));
        }
        assert!(!sim.trigger(ClinicalEventKind::Desaturation, 14_000, 1_000));
    }

    #[test]
    fn test_active_override_in_band() {
        let mut sim = ClinicalEventSimulator::new(SimulatorConfig::disabled());
        let mut rng = StdRng::seed_from_u64(11);
        assert!(sim.trigger(ClinicalEventKind::Bradycardia, 0, 20_000));

        for t in 0..200 {
            let value = sim
                .override_value(VitalChannel::HeartRate, t * 100, &mut rng)
                .unwrap();
            assert!((60.0..80.0).contains(&value), "{} out of band", value);
        }
        assert!(sim
            .override_value(VitalChannel::Spo2, 1000, &mut rng)
            .is_none());
    }

    #[test]
    fn test_recovery_interpolates_to_baseline() {
        let mut sim = ClinicalEventSimulator::new(SimulatorConfig::disabled());
        let mut rng = StdRng::seed_from_u64(5);
        sim.trigger(ClinicalEventKind::Desaturation, 0, 1_000);
        sim.advance(1_000, &mut rng);

        let start = sim
            .override_value(VitalChannel::Spo2, 1_000, &mut rng)
            .unwrap();
        let half = sim
            .override_value(VitalChannel::Spo2, 6_000, &mut rng)
            .unwrap();
        let end = sim
            .override_value(VitalChannel::Spo2, 11_000, &mut rng)
            .unwrap();
        let mean = VitalChannel::Spo2.profile().mean;

        approx::assert_relative_eq!(start, 70.0);
        approx::assert_relative_eq!(half, 70.0 + (mean - 70.0) / 2.0);
        approx::assert_relative_eq!(end, mean);
    }

    #[test]
    fn test_event_probability_rate() {
        let config = SimulatorConfig {
            event_probability: 0.05,
            min_event_ms: 1_000,
            max_event_ms: 1_000,
            recovery_ms: 1_000,
            ..Default::default()
        };
        let mut sim = ClinicalEventSimulator::new(config);
        let mut rng = StdRng::seed_from_u64(42);
        let mut starts = 0;
        let mut previous = EventPhase::Idle;

        for t in 0..20_000u64 {
            let phase = sim.advance(t * 1000, &mut rng);
            if previous.is_idle() && !phase.is_idle() {
                starts += 1;
            }
            previous = phase;
        }
        // Events occupy ~2 ticks of every cycle, so expect well over 500 starts.
        assert!(starts > 500 && starts < 1_500, "starts = {}", starts);
    }
}
