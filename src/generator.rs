// NICU Monitor - Neonatal vital-sign telemetry simulation
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Per-channel value generation.
//!
//! Normal values are drawn from each channel's baseline distribution,
//! truncated to its normal band. The clinical event simulator may override
//! a channel; every value is finally clamped to the plausible range.

use crate::channel::{ChannelProfile, VitalChannel};
use crate::config::SimulatorConfig;
use crate::simulator::{ClinicalEventKind, ClinicalEventSimulator, EventPhase};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::StandardNormal;

/// Random source injected into the generator.
pub type BoxedRng = Box<dyn RngCore + Send>;

/// Draw a normal-band value for a channel.
pub fn baseline_value(profile: &ChannelProfile, rng: &mut (impl Rng + ?Sized)) -> f64 {
    let z: f64 = rng.sample(StandardNormal);
    let limit = ChannelProfile::NORMAL_BAND_SIGMAS;
    profile.mean + z.clamp(-limit, limit) * profile.std_dev
}

/// Value source for all channels: baseline draws plus simulated events.
pub struct VitalGenerator {
    simulator: ClinicalEventSimulator,
    rng: BoxedRng,
}

impl VitalGenerator {
    /// Generator with an entropy-seeded random source.
    pub fn new(config: SimulatorConfig) -> Self {
        Self::with_rng(config, Box::new(StdRng::from_entropy()))
    }

    /// Generator with a caller-supplied random source.
    pub fn with_rng(config: SimulatorConfig, rng: BoxedRng) -> Self {
        Self {
            simulator: ClinicalEventSimulator::new(config),
            rng,
        }
    }

    /// Deterministic generator.
    pub fn seeded(config: SimulatorConfig, seed: u64) -> Self {
        Self::with_rng(config, Box::new(StdRng::seed_from_u64(seed)))
    }

    /// Step the event simulator. Call once per tick.
    pub fn advance(&mut self, now_ms: u64) -> EventPhase {
        self.simulator.advance(now_ms, &mut *self.rng)
    }

    /// Produce the value for `channel` at `now_ms`.
    pub fn next_value(&mut self, channel: VitalChannel, now_ms: u64) -> f64 {
        let profile = channel.profile();
        let raw = match self
            .simulator
            .override_value(channel, now_ms, &mut *self.rng)
        {
            Some(value) => value,
            None => baseline_value(&profile, &mut *self.rng),
        };
        profile.clamp(raw)
    }

    pub fn trigger_event(&mut self, kind: ClinicalEventKind, now_ms: u64, duration_ms: u64) -> bool {
        self.simulator.trigger(kind, now_ms, duration_ms)
    }

    pub fn simulator(&self) -> &ClinicalEventSimulator {
        &self.simulator
    }

    pub fn set_simulator_config(&mut self, config: SimulatorConfig) {
        self.simulator.set_config(config);
    }

    pub fn reset(&mut self) {
        self.simulator.reset();
    }
}

impl std::fmt::Debug for VitalGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VitalGenerator")
            .field("simulator", &self.simulator)
            .finish_non_exhaustive()
    }
}
