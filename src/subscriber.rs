// NICU Monitor - Neonatal vital-sign telemetry simulation
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Subscriber registry with panic isolation.

use crate::event::MonitorEvent;
use log::warn;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

type Callback = Arc<dyn Fn(&MonitorEvent) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    subscribers: Vec<(u64, Callback)>,
}

/// Set of event listeners shared by a stream.
#[derive(Clone, Default)]
pub struct SubscriberRegistry {
    inner: Arc<Mutex<Registry>>,
    failures: Arc<AtomicU64>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&MonitorEvent) + Send + Sync + 'static,
    {
        let mut registry = self.lock();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.subscribers.push((id, Arc::new(callback)));
        Subscription {
            id,
            registry: Arc::downgrade(&self.inner),
        }
    }

    /// Deliver an event to every listener registered at call time.
    ///
    /// A panicking listener is logged and counted; the others still
    /// receive the event. Returns the number of failed deliveries.
    pub fn emit(&self, event: &MonitorEvent) -> usize {
        self.emit_while(event, || true)
    }

    /// Like [`emit`](Self::emit), but stops before any listener once
    /// `proceed` returns false. A listener may invalidate the event for
    /// those after it, e.g. by disconnecting the stream.
    pub fn emit_while(&self, event: &MonitorEvent, proceed: impl Fn() -> bool) -> usize {
        // Snapshot so listeners may (un)subscribe while being called.
        let callbacks: Vec<(u64, Callback)> = self.lock().subscribers.clone();

        let mut failed = 0;
        for (id, callback) in callbacks {
            if !proceed() {
                break;
            }
            if catch_unwind(AssertUnwindSafe(|| callback(event))).is_err() {
                warn!("Subscriber {} panicked while handling an event", id);
                failed += 1;
            }
        }
        if failed > 0 {
            self.failures.fetch_add(failed as u64, Ordering::Relaxed);
        }
        failed
    }

    pub fn len(&self) -> usize {
        self.lock().subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total failed deliveries since creation.
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        // Callbacks never run under this lock, so poisoning cannot leave it
        // half-updated.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for SubscriberRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriberRegistry")
            .field("subscribers", &self.len())
            .field("failures", &self.failures())
            .finish()
    }
}

/// Handle returned by `subscribe`.
///
/// Dropping the handle keeps the listener registered; call
/// [`Subscription::unsubscribe`] to remove it.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Remove the listener. Returns false if it was already gone.
    pub fn unsubscribe(self) -> bool {
        let Some(registry) = self.registry.upgrade() else {
            return false;
        };
        let mut registry = registry
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let before = registry.subscribers.len();
        registry.subscribers.retain(|(id, _)| *id != self.id);
        registry.subscribers.len() != before
    }
}
