// NICU Monitor - Neonatal vital-sign telemetry simulation
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Synchronous tick processing.
//!
//! `VitalPipeline` owns everything a tick touches: per-channel history, the
//! latest value of each channel, the generator and the threshold engine.
//! It has no notion of time or scheduling; callers pass the tick timestamp.

use crate::channel::VitalChannel;
use crate::config::{ConfigUpdate, MonitorConfig};
use crate::engine::ThresholdEngine;
use crate::error::Result;
use crate::event::MonitorEvent;
use crate::generator::{BoxedRng, VitalGenerator};
use crate::ring_buffer::RingBuffer;
use crate::sample::Sample;
use crate::simulator::{ClinicalEventKind, EventPhase};
use crate::threshold::ThresholdTable;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Counters since the pipeline was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamStats {
    pub ticks: u64,
    pub samples: u64,
    pub alerts: u64,
    pub subscriber_failures: u64,
}

/// What a configuration update changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfigChange {
    pub interval_changed: bool,
    pub capacity_changed: bool,
}

/// Per-tick generation, buffering and threshold evaluation.
#[derive(Debug)]
pub struct VitalPipeline {
    config: MonitorConfig,
    buffers: HashMap<VitalChannel, RingBuffer<Sample>>,
    latest: HashMap<VitalChannel, Sample>,
    generator: VitalGenerator,
    engine: ThresholdEngine,
    stats: StreamStats,
}

impl VitalPipeline {
    /// Pipeline with an entropy-seeded random source.
    pub fn new(config: MonitorConfig) -> Result<Self> {
        config.validate()?;
        let generator = VitalGenerator::new(config.simulator.clone());
        Self::build(config, generator)
    }

    /// Pipeline with a caller-supplied random source.
    pub fn with_rng(config: MonitorConfig, rng: BoxedRng) -> Result<Self> {
        config.validate()?;
        let generator = VitalGenerator::with_rng(config.simulator.clone(), rng);
        Self::build(config, generator)
    }

    fn build(config: MonitorConfig, generator: VitalGenerator) -> Result<Self> {
        Ok(Self {
            buffers: Self::make_buffers(config.buffer_capacity)?,
            latest: HashMap::new(),
            generator,
            engine: ThresholdEngine::default(),
            stats: StreamStats::default(),
            config,
        })
    }

    fn make_buffers(capacity: usize) -> Result<HashMap<VitalChannel, RingBuffer<Sample>>> {
        VitalChannel::ALL
            .iter()
            .map(|&channel| Ok((channel, RingBuffer::new(capacity)?)))
            .collect()
    }

    /// Run one tick at `now_ms` and return the events to fan out, in order.
    pub fn tick(&mut self, now_ms: u64) -> Vec<MonitorEvent> {
        self.stats.ticks += 1;
        self.generator.advance(now_ms);

        let mut events = Vec::with_capacity(VitalChannel::ALL.len());
        for channel in VitalChannel::ALL {
            let value = self.generator.next_value(channel, now_ms);
            let sample = Sample::new(channel, value, now_ms);
            self.store(sample.clone());
            self.stats.samples += 1;

            let alerts = if self.config.alerts_enabled {
                self.engine.evaluate(
                    &sample,
                    self.config.tick_interval_ms,
                    self.config.cooldown_ms,
                )
            } else {
                Vec::new()
            };

            events.push(MonitorEvent::vital(sample));
            self.stats.alerts += alerts.len() as u64;
            events.extend(alerts.into_iter().map(MonitorEvent::alert));
        }
        events
    }

    /// Store an externally supplied sample (e.g. manual entry).
    ///
    /// The sample joins the channel history but is not run through the
    /// threshold engine, whose durations are counted in monitor ticks.
    pub fn record(&mut self, sample: Sample) -> MonitorEvent {
        self.store(sample.clone());
        self.stats.samples += 1;
        MonitorEvent::vital(sample)
    }

    fn store(&mut self, sample: Sample) {
        if let Some(buffer) = self.buffers.get_mut(&sample.channel) {
            buffer.push(sample.clone());
        }
        self.latest.insert(sample.channel, sample);
    }

    /// History for a channel, oldest first.
    pub fn buffer(&self, channel: VitalChannel) -> Vec<Sample> {
        self.buffers
            .get(&channel)
            .map(RingBuffer::to_vec)
            .unwrap_or_default()
    }

    pub fn latest_value(&self, channel: VitalChannel) -> Option<&Sample> {
        self.latest.get(&channel)
    }

    /// Validate and apply a partial update.
    ///
    /// A capacity change rebuilds every buffer, dropping history. Nothing is
    /// applied if the merged configuration is invalid.
    pub fn apply_config(&mut self, update: &ConfigUpdate) -> Result<ConfigChange> {
        let merged = self.config.merged(update);
        merged.validate()?;

        let change = ConfigChange {
            interval_changed: merged.tick_interval_ms != self.config.tick_interval_ms,
            capacity_changed: merged.buffer_capacity != self.config.buffer_capacity,
        };

        if change.capacity_changed {
            self.buffers = Self::make_buffers(merged.buffer_capacity)?;
            debug!(
                "Buffers rebuilt with capacity {}, history dropped",
                merged.buffer_capacity
            );
        }
        if merged.alerts_enabled != self.config.alerts_enabled {
            // Unevaluated ticks break any run of consecutive violations.
            self.engine.clear_violations();
        }
        if merged.simulator != self.config.simulator {
            self.generator.set_simulator_config(merged.simulator.clone());
        }
        self.config = merged;
        Ok(change)
    }

    pub fn set_thresholds(&mut self, table: ThresholdTable) {
        self.engine.set_table(table);
    }

    pub fn trigger_event(&mut self, kind: ClinicalEventKind, now_ms: u64, duration_ms: u64) -> bool {
        self.generator.trigger_event(kind, now_ms, duration_ms)
    }

    pub fn event_phase(&self) -> EventPhase {
        self.generator.simulator().phase()
    }

    /// Clear history, latest values, event state and alert tracking.
    pub fn reset(&mut self) {
        self.buffers.values_mut().for_each(RingBuffer::clear);
        self.latest.clear();
        self.generator.reset();
        self.engine.reset();
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn engine(&self) -> &ThresholdEngine {
        &self.engine
    }

    pub fn stats(&self) -> StreamStats {
        self.stats
    }
}
