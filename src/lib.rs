//! # NICU Monitor - Neonatal vital-sign telemetry simulation
//!
//! A simulated bedside monitor that streams six vital-sign channels for one
//! patient, keeps bounded history per channel and raises duration-qualified
//! threshold alerts.
//!
//! ## Key Features
//!
//! - **Realistic baselines**: Per-channel Gaussian draws within a normal band
//! - **Clinical events**: Bradycardia and desaturation episodes with recovery
//! - **Sustained-violation alerts**: Rules fire only after a hold duration
//! - **Severity precedence**: Critical limits suppress their warning limits
//!
//! ## Quick Start
//!
//! ```rust
//! use nicu_monitor::{MonitorConfig, VitalChannel, VitalPipeline};
//!
//! let mut pipeline = VitalPipeline::new(MonitorConfig::default()).unwrap();
//!
//! // One tick produces a vital event per channel
//! let events = pipeline.tick(1_000);
//! assert_eq!(events.iter().filter(|e| e.as_sample().is_some()).count(), 6);
//!
//! let hr = pipeline.latest_value(VitalChannel::HeartRate).unwrap();
//! assert!(hr.value >= 30.0 && hr.value <= 250.0);
//! ```
//!
//! ## Modules
//!
//! - [`channel`]: Vital channels and their physiological profiles
//! - [`generator`]: Per-channel value generation
//! - [`simulator`]: Clinical event lifecycle
//! - [`threshold`]: Alert rules and the neonatal rule table
//! - [`engine`]: Sustained-violation tracking and cooldowns
//! - [`pipeline`]: Synchronous tick processing
//! - [`stream`]: Scheduled streaming and subscriber fan-out

// Modules
pub mod alert;
pub mod channel;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod generator;
pub mod pipeline;
pub mod ring_buffer;
pub mod sample;
pub mod simulator;
pub mod stream;
pub mod subscriber;
pub mod threshold;

// Re-exports for convenient access
pub use alert::{Alert, AlertCategory, AlertSeverity};
pub use channel::{ChannelProfile, VitalChannel};
pub use config::{ConfigUpdate, MonitorConfig, SimulatorConfig};
pub use engine::ThresholdEngine;
pub use error::{MonitorError, Result};
pub use event::{ConnectionStatus, MonitorEvent};
pub use generator::{BoxedRng, VitalGenerator};
pub use pipeline::{ConfigChange, StreamStats, VitalPipeline};
pub use ring_buffer::RingBuffer;
pub use sample::{Sample, SampleSource};
pub use simulator::{ClinicalEventKind, ClinicalEventSimulator, EventPhase};
pub use stream::MonitorStream;
pub use subscriber::{SubscriberRegistry, Subscription};
pub use threshold::{RuleKind, ThresholdRule, ThresholdTable};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
