// NICU Monitor - Neonatal vital-sign telemetry simulation
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! MonitorStream - periodic tick orchestration and event fan-out.
//!
//! A single tokio interval task drives [`VitalPipeline::tick`]. Every tick
//! and every lifecycle transition runs under one dispatch gate, so:
//!
//! - two ticks never overlap, even while the scheduler is being replaced;
//! - no vital or alert event is delivered after the `Disconnected` event.
//!
//! Each connection is a *session* and each scheduler task a *schedule*;
//! both are numbered, and a tick from a stale schedule does nothing.

use crate::channel::VitalChannel;
use crate::config::{ConfigUpdate, MonitorConfig};
use crate::error::{MonitorError, Result};
use crate::event::{ConnectionStatus, MonitorEvent};
use crate::generator::BoxedRng;
use crate::pipeline::{StreamStats, VitalPipeline};
use crate::sample::Sample;
use crate::simulator::{ClinicalEventKind, EventPhase};
use crate::subscriber::{SubscriberRegistry, Subscription};
use crate::threshold::ThresholdTable;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::thread::{self, ThreadId};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Maps the tokio clock onto Unix epoch milliseconds.
#[derive(Debug, Clone, Copy)]
struct StreamClock {
    base_ms: u64,
    started: Instant,
}

impl StreamClock {
    fn start() -> Self {
        let base_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self {
            base_ms,
            started: Instant::now(),
        }
    }

    fn now_ms(&self) -> u64 {
        self.base_ms + self.started.elapsed().as_millis() as u64
    }
}

#[derive(Debug)]
struct StreamState {
    pipeline: VitalPipeline,
    status: ConnectionStatus,
    patient_id: Option<String>,
    clock: StreamClock,
    runtime: Option<Handle>,
    scheduler: Option<JoinHandle<()>>,
}

#[derive(Debug)]
struct Shared {
    state: Mutex<StreamState>,
    subscribers: SubscriberRegistry,
    /// Serializes ticks and lifecycle transitions.
    gate: Mutex<()>,
    /// Thread currently holding `gate`, for calls made from subscribers.
    gate_owner: Mutex<Option<ThreadId>>,
    session: AtomicU64,
    schedule: AtomicU64,
}

/// Clears `gate_owner` when the gated section ends, even on panic.
struct GateOwnership<'a>(&'a Mutex<Option<ThreadId>>);

impl Drop for GateOwnership<'_> {
    fn drop(&mut self) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl Shared {
    fn lock_state(&self) -> MutexGuard<'_, StreamState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` under the dispatch gate. Re-entrant on the owning thread, so
    /// a subscriber may call `disconnect` or `update_config`.
    fn with_gate<R>(&self, f: impl FnOnce() -> R) -> R {
        let me = thread::current().id();
        if *self.gate_owner.lock().unwrap_or_else(PoisonError::into_inner) == Some(me) {
            return f();
        }

        let _gate = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        *self.gate_owner.lock().unwrap_or_else(PoisonError::into_inner) = Some(me);
        let _ownership = GateOwnership(&self.gate_owner);
        f()
    }

    /// Scheduler entry point. Returns false once the schedule is stale.
    fn run_tick(&self, session: u64, schedule: u64) -> bool {
        self.with_gate(|| {
            let events = {
                let mut state = self.lock_state();
                if self.session.load(Ordering::SeqCst) != session
                    || self.schedule.load(Ordering::SeqCst) != schedule
                    || state.status != ConnectionStatus::Connected
                {
                    return false;
                }
                let now_ms = state.clock.now_ms();
                state.pipeline.tick(now_ms)
            };
            self.deliver(session, &events);
            true
        })
    }

    /// Fan out events while `session` is still current. Checked before every
    /// listener, since any listener may end the session.
    fn deliver(&self, session: u64, events: &[MonitorEvent]) {
        let current = || self.session.load(Ordering::SeqCst) == session;
        for event in events {
            if !current() {
                break;
            }
            self.subscribers.emit_while(event, current);
        }
    }

    /// Stop the scheduler and announce the disconnect. Caller holds the gate.
    fn teardown(&self, next: ConnectionStatus) -> bool {
        {
            let mut state = self.lock_state();
            if state.status != ConnectionStatus::Connected {
                return false;
            }
            self.session.fetch_add(1, Ordering::SeqCst);
            self.schedule.fetch_add(1, Ordering::SeqCst);
            if let Some(task) = state.scheduler.take() {
                task.abort();
            }
            state.status = next;
            if let Some(patient_id) = &state.patient_id {
                info!("Monitor disconnected from patient {}", patient_id);
            }
        }
        self.subscribers
            .emit(&MonitorEvent::connection(ConnectionStatus::Disconnected));
        true
    }

    /// Spawn a fresh scheduler task for the current session. Caller holds the gate.
    fn start_scheduler(self: &Arc<Self>, state: &mut StreamState) {
        if let Some(task) = state.scheduler.take() {
            task.abort();
        }
        let schedule = self.schedule.fetch_add(1, Ordering::SeqCst) + 1;
        let session = self.session.load(Ordering::SeqCst);
        let interval_ms = state.pipeline.config().tick_interval_ms;

        state.scheduler = state.runtime.as_ref().map(|runtime| {
            debug!("Tick scheduler started at {}ms", interval_ms);
            runtime.spawn(tick_loop(Arc::downgrade(self), session, schedule, interval_ms))
        });
    }
}

async fn tick_loop(shared: Weak<Shared>, session: u64, schedule: u64, interval_ms: u64) {
    let period = Duration::from_millis(interval_ms);
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let Some(shared) = shared.upgrade() else {
            break;
        };
        if !shared.run_tick(session, schedule) {
            break;
        }
    }
}

/// Simulated bedside monitor for one patient at a time.
///
/// Must be connected from within a tokio runtime; the scheduler task is
/// spawned on the runtime current at `connect`.
#[derive(Debug)]
pub struct MonitorStream {
    shared: Arc<Shared>,
}

impl MonitorStream {
    /// Stream with an entropy-seeded random source.
    pub fn new(config: MonitorConfig) -> Result<Self> {
        Ok(Self::from_pipeline(VitalPipeline::new(config)?))
    }

    /// Stream with a caller-supplied random source.
    pub fn with_rng(config: MonitorConfig, rng: BoxedRng) -> Result<Self> {
        Ok(Self::from_pipeline(VitalPipeline::with_rng(config, rng)?))
    }

    /// Deterministic stream.
    pub fn seeded(config: MonitorConfig, seed: u64) -> Result<Self> {
        Self::with_rng(config, Box::new(StdRng::seed_from_u64(seed)))
    }

    fn from_pipeline(pipeline: VitalPipeline) -> Self {
        let state = StreamState {
            pipeline,
            status: ConnectionStatus::Disconnected,
            patient_id: None,
            clock: StreamClock::start(),
            runtime: None,
            scheduler: None,
        };
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                subscribers: SubscriberRegistry::new(),
                gate: Mutex::new(()),
                gate_owner: Mutex::new(None),
                session: AtomicU64::new(0),
                schedule: AtomicU64::new(0),
            }),
        }
    }

    /// Start streaming for `patient_id`.
    ///
    /// An existing connection is torn down first. All history, event and
    /// alert state is reset before the first tick.
    pub fn connect(&self, patient_id: &str) -> Result<()> {
        let runtime = Handle::try_current().map_err(|_| MonitorError::NoRuntime)?;
        let shared = &self.shared;

        shared.with_gate(|| {
            shared.teardown(ConnectionStatus::Reconnecting);
            {
                let mut state = shared.lock_state();
                state.pipeline.reset();
                state.patient_id = Some(patient_id.to_string());
                state.status = ConnectionStatus::Connected;
                state.clock = StreamClock::start();
                state.runtime = Some(runtime);
                shared.session.fetch_add(1, Ordering::SeqCst);
                shared.start_scheduler(&mut state);
            }
            info!("Monitor connected to patient {}", patient_id);
            shared
                .subscribers
                .emit(&MonitorEvent::connection(ConnectionStatus::Connected));
        });
        Ok(())
    }

    /// Stop streaming. No-op when already disconnected.
    pub fn disconnect(&self) {
        let shared = &self.shared;
        shared.with_gate(|| {
            if shared.teardown(ConnectionStatus::Disconnected) {
                shared.lock_state().patient_id = None;
            }
        });
    }

    pub fn is_connected(&self) -> bool {
        self.connection_status() == ConnectionStatus::Connected
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        self.shared.lock_state().status
    }

    pub fn patient_id(&self) -> Option<String> {
        self.shared.lock_state().patient_id.clone()
    }

    /// Register a listener for vital, alert and connection events.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&MonitorEvent) + Send + Sync + 'static,
    {
        self.shared.subscribers.subscribe(callback)
    }

    /// Channel history, oldest first.
    pub fn buffer(&self, channel: VitalChannel) -> Vec<Sample> {
        self.shared.lock_state().pipeline.buffer(channel)
    }

    pub fn latest_value(&self, channel: VitalChannel) -> Option<Sample> {
        self.shared
            .lock_state()
            .pipeline
            .latest_value(channel)
            .cloned()
    }

    /// Merge a partial update into the live configuration.
    ///
    /// Invalid updates are rejected whole. A capacity change drops history;
    /// an interval change restarts the scheduler, keeping subscribers and
    /// state.
    pub fn update_config(&self, update: ConfigUpdate) -> Result<()> {
        let shared = &self.shared;
        shared.with_gate(|| {
            let mut state = shared.lock_state();
            let change = state.pipeline.apply_config(&update)?;
            if change.interval_changed && state.status == ConnectionStatus::Connected {
                shared.start_scheduler(&mut state);
            }
            Ok(())
        })
    }

    pub fn config(&self) -> MonitorConfig {
        self.shared.lock_state().pipeline.config().clone()
    }

    /// Replace the threshold rules. Violation and cooldown tracking restart.
    pub fn set_thresholds(&self, table: ThresholdTable) {
        let shared = &self.shared;
        shared.with_gate(|| shared.lock_state().pipeline.set_thresholds(table));
    }

    /// Record a manually entered sample and announce it to subscribers.
    pub fn record_manual(&self, channel: VitalChannel, value: f64) {
        let shared = &self.shared;
        shared.with_gate(|| {
            let (session, event) = {
                let mut state = shared.lock_state();
                let now_ms = state.clock.now_ms();
                let event = state.pipeline.record(Sample::manual(channel, value, now_ms));
                (shared.session.load(Ordering::SeqCst), event)
            };
            shared.deliver(session, std::slice::from_ref(&event));
        });
    }

    /// Start a clinical event now. Returns false while another is running.
    pub fn trigger_event(&self, kind: ClinicalEventKind, duration: Duration) -> bool {
        let shared = &self.shared;
        shared.with_gate(|| {
            let mut state = shared.lock_state();
            let now_ms = state.clock.now_ms();
            state
                .pipeline
                .trigger_event(kind, now_ms, duration.as_millis() as u64)
        })
    }

    pub fn event_phase(&self) -> EventPhase {
        self.shared.lock_state().pipeline.event_phase()
    }

    pub fn stats(&self) -> StreamStats {
        let mut stats = self.shared.lock_state().pipeline.stats();
        stats.subscriber_failures = self.shared.subscribers.failures();
        stats
    }
}

impl Drop for MonitorStream {
    fn drop(&mut self) {
        self.shared.schedule.fetch_add(1, Ordering::SeqCst);
        if let Some(task) = self.shared.lock_state().scheduler.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulatorConfig;

    fn quiet_config() -> MonitorConfig {
        MonitorConfig::new().with_simulator(SimulatorConfig::disabled())
    }

    #[test]
    fn test_connect_requires_runtime() {
        let stream = MonitorStream::seeded(quiet_config(), 1).unwrap();
        assert_eq!(stream.connect("p1"), Err(MonitorError::NoRuntime));
        assert!(!stream.is_connected());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = quiet_config().with_tick_interval_ms(0);
        assert!(MonitorStream::new(config).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_and_tick() {
        let stream = MonitorStream::seeded(quiet_config(), 1).unwrap();
        stream.connect("p1").unwrap();
        assert!(stream.is_connected());
        assert_eq!(stream.patient_id().as_deref(), Some("p1"));

        tokio::time::sleep(Duration::from_millis(3_500)).await;
        assert_eq!(stream.stats().ticks, 3);
        assert_eq!(stream.buffer(VitalChannel::HeartRate).len(), 3);
        assert!(stream.latest_value(VitalChannel::Spo2).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_is_idempotent() {
        let stream = MonitorStream::seeded(quiet_config(), 1).unwrap();
        stream.disconnect();
        stream.connect("p1").unwrap();
        stream.disconnect();
        stream.disconnect();
        assert_eq!(stream.connection_status(), ConnectionStatus::Disconnected);
        assert!(stream.patient_id().is_none());

        tokio::time::sleep(Duration::from_millis(3_000)).await;
        assert_eq!(stream.stats().ticks, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_trigger_event() {
        let stream = MonitorStream::seeded(quiet_config(), 1).unwrap();
        stream.connect("p1").unwrap();
        assert!(stream.trigger_event(ClinicalEventKind::Desaturation, Duration::from_secs(8)));
        assert!(!stream.trigger_event(ClinicalEventKind::Bradycardia, Duration::from_secs(8)));
        assert_eq!(
            stream.event_phase().kind(),
            Some(ClinicalEventKind::Desaturation)
        );

        tokio::time::sleep(Duration::from_millis(3_500)).await;
        let spo2 = stream.latest_value(VitalChannel::Spo2).unwrap();
        assert!(spo2.value >= 70.0 && spo2.value < 85.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_record_manual() {
        let stream = MonitorStream::seeded(quiet_config(), 1).unwrap();
        stream.record_manual(VitalChannel::Temperature, 36.4);
        let latest = stream.latest_value(VitalChannel::Temperature).unwrap();
        assert_eq!(latest.source, crate::sample::SampleSource::Manual);
        assert_eq!(stream.buffer(VitalChannel::Temperature).len(), 1);
    }
}
