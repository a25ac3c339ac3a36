//! Instrumented provider: simulated digest cost plus call and overlap counters.

use log::error;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use super::hashing::HashProvider;

/// Snapshot of an [`InstrumentedProvider`]'s counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProviderStats {
    pub fast_calls: usize,
    pub slow_calls: usize,
    /// Highest number of `slow_digest` calls observed in flight at once. Must stay at 1.
    pub max_slow_in_flight: usize,
    /// Number of `slow_digest` entries that found another call already in flight.
    pub slow_overlaps: usize,
}

/// Wraps any provider, sleeps `fast_delay` / `slow_delay` per call, and tracks how many
/// `slow_digest` calls are in flight. An overlap is logged at error level; it means the gate was
/// bypassed.
pub struct InstrumentedProvider<P> {
    inner: P,
    fast_delay: Duration,
    slow_delay: Duration,
    fast_calls: AtomicUsize,
    slow_calls: AtomicUsize,
    slow_in_flight: AtomicUsize,
    max_slow_in_flight: AtomicUsize,
    slow_overlaps: AtomicUsize,
}

impl<P: HashProvider> InstrumentedProvider<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            fast_delay: Duration::ZERO,
            slow_delay: Duration::ZERO,
            fast_calls: AtomicUsize::new(0),
            slow_calls: AtomicUsize::new(0),
            slow_in_flight: AtomicUsize::new(0),
            max_slow_in_flight: AtomicUsize::new(0),
            slow_overlaps: AtomicUsize::new(0),
        }
    }

    pub fn with_delays(mut self, fast_delay: Duration, slow_delay: Duration) -> Self {
        self.fast_delay = fast_delay;
        self.slow_delay = slow_delay;
        self
    }

    pub fn stats(&self) -> ProviderStats {
        ProviderStats {
            fast_calls: self.fast_calls.load(Ordering::SeqCst),
            slow_calls: self.slow_calls.load(Ordering::SeqCst),
            max_slow_in_flight: self.max_slow_in_flight.load(Ordering::SeqCst),
            slow_overlaps: self.slow_overlaps.load(Ordering::SeqCst),
        }
    }
}

impl<P: HashProvider> HashProvider for InstrumentedProvider<P> {
    fn fast_digest(&self, data: &str) -> String {
        self.fast_calls.fetch_add(1, Ordering::Relaxed);
        if !self.fast_delay.is_zero() {
            thread::sleep(self.fast_delay);
        }
        self.inner.fast_digest(data)
    }

    fn slow_digest(&self, data: &str) -> String {
        self.slow_calls.fetch_add(1, Ordering::Relaxed);
        let in_flight = self.slow_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_slow_in_flight.fetch_max(in_flight, Ordering::SeqCst);
        if in_flight > 1 {
            self.slow_overlaps.fetch_add(1, Ordering::SeqCst);
            error!(
                "slow digest overheated: {} concurrent calls (input {:?})",
                in_flight, data
            );
        }
        if !self.slow_delay.is_zero() {
            thread::sleep(self.slow_delay);
        }
        let out = self.inner.slow_digest(data);
        self.slow_in_flight.fetch_sub(1, Ordering::SeqCst);
        out
    }
}
