//! Slow-digest gate and the signer capability handed to stage workers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::engine::hashing::HashProvider;

/// Mutual exclusion around the slow digest. One gate per pipeline run unless the caller injects a
/// shared one (e.g. several runs against the same provider).
#[derive(Debug, Default)]
pub struct SlowDigestGate {
    lock: Mutex<()>,
    acquisitions: AtomicUsize,
}

impl SlowDigestGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the gate. Only `f` is inside the critical section.
    pub fn with_lock<T>(&self, f: impl FnOnce() -> T) -> T {
        // The guarded value is `()`, so a poisoned lock carries no broken state.
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        self.acquisitions.fetch_add(1, Ordering::Relaxed);
        f()
    }

    /// How many times the gate has been entered.
    pub fn acquisitions(&self) -> usize {
        self.acquisitions.load(Ordering::Relaxed)
    }
}

/// Provider plus gate. Cheap to clone; every stage of a run shares the same gate.
#[derive(Clone)]
pub struct Signer {
    provider: Arc<dyn HashProvider>,
    gate: Arc<SlowDigestGate>,
}

impl Signer {
    /// Signer with a fresh gate.
    pub fn new(provider: Arc<dyn HashProvider>) -> Self {
        Self::with_gate(provider, Arc::new(SlowDigestGate::new()))
    }

    pub fn with_gate(provider: Arc<dyn HashProvider>, gate: Arc<SlowDigestGate>) -> Self {
        Self { provider, gate }
    }

    /// Unrestricted fast digest.
    pub fn fast(&self, data: &str) -> String {
        self.provider.fast_digest(data)
    }

    /// Slow digest, serialized through the gate.
    pub fn slow(&self, data: &str) -> String {
        self.gate.with_lock(|| self.provider.slow_digest(data))
    }

    pub fn gate(&self) -> &Arc<SlowDigestGate> {
        &self.gate
    }
}
