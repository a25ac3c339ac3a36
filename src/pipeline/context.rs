//! Stage context: the per-stage state a coordinator and its workers share, plus handles for a
//! spawned pipeline.

use crossbeam_channel::{Receiver, Sender, bounded};
use log::{debug, warn};
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use super::gate::Signer;
use crate::{ConversionError, DroppedItem, Item, StageReport};

/// Run-wide record of dropped items, shared by every stage.
pub type DropLog = Arc<Mutex<Vec<DroppedItem>>>;

/// Lifecycle of one stage. Only moves forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum StageState {
    /// Draining upstream and spawning workers.
    Running = 0,
    /// Upstream closed; waiting on outstanding workers.
    Draining = 1,
    /// Downstream channel closed.
    Closed = 2,
}

impl StageState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => StageState::Running,
            1 => StageState::Draining,
            _ => StageState::Closed,
        }
    }
}

/// What a stage sees while it runs: its name, the run's signer, the drop log, and counters.
pub struct StageContext {
    name: String,
    signer: Signer,
    dropped_log: DropLog,
    worker_cap: usize,
    received: AtomicUsize,
    emitted: AtomicUsize,
    dropped: AtomicUsize,
    state: AtomicU8,
}

impl StageContext {
    pub fn new(
        name: impl Into<String>,
        signer: Signer,
        dropped_log: DropLog,
        worker_cap: usize,
    ) -> Self {
        Self {
            name: name.into(),
            signer,
            dropped_log,
            worker_cap: worker_cap.max(1),
            received: AtomicUsize::new(0),
            emitted: AtomicUsize::new(0),
            dropped: AtomicUsize::new(0),
            state: AtomicU8::new(StageState::Running as u8),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn signer(&self) -> &Signer {
        &self.signer
    }

    /// Most per-item workers [`spawn_per_item`](Self::spawn_per_item) keeps alive at once.
    pub fn worker_cap(&self) -> usize {
        self.worker_cap
    }

    pub fn state(&self) -> StageState {
        StageState::from_u8(self.state.load(Ordering::SeqCst))
    }

    fn advance(&self, to: StageState) {
        let prev = StageState::from_u8(self.state.fetch_max(to as u8, Ordering::SeqCst));
        if prev < to {
            debug!("{}: {:?} -> {:?}", self.name, prev, to);
        }
    }

    /// Upstream is closed; only outstanding workers remain.
    pub fn mark_draining(&self) {
        self.advance(StageState::Draining);
    }

    /// Downstream has been closed. Called by the executor's stage coordinator only.
    pub(crate) fn mark_closed(&self) {
        self.advance(StageState::Closed);
    }

    pub fn record_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    /// Send `item` downstream. Returns false when the receiving side is gone (caller abandoned
    /// the output), in which case the item is not counted as emitted.
    pub fn emit(&self, output: &Sender<Item>, item: Item) -> bool {
        match output.send(item) {
            Ok(()) => {
                self.emitted.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(_) => {
                debug!("{}: downstream closed, discarding result", self.name);
                false
            }
        }
    }

    /// Log and record an item that failed conversion. The stage keeps going.
    pub fn drop_item(&self, item: Item, error: ConversionError) {
        warn!("{}: dropping {} item: {}", self.name, item.kind(), error);
        self.dropped.fetch_add(1, Ordering::Relaxed);
        self.dropped_log
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(DroppedItem {
                stage: self.name.clone(),
                item,
                error,
            });
    }

    /// Emit the result of one item's work, or drop the item when its conversion failed.
    pub fn settle(&self, output: &Sender<Item>, item: Item, result: Result<Item, ConversionError>) {
        match result {
            Ok(out) => {
                self.emit(output, out);
            }
            Err(e) => self.drop_item(item, e),
        }
    }

    /// Per-item fan-out with a completion barrier: every upstream item gets its own worker running
    /// `work`, with at most [`worker_cap`](Self::worker_cap) alive at once. Returns only after
    /// upstream is closed AND every worker has emitted or dropped.
    pub fn spawn_per_item<F>(&self, input: &Receiver<Item>, output: &Sender<Item>, work: F)
    where
        F: Fn(&Item) -> Result<Item, ConversionError> + Sync,
    {
        let work = &work;
        let slots = WorkerSlots::new(self.worker_cap);
        let slots = &slots;
        thread::scope(|s| {
            let mut spawned = 0_usize;
            for item in input.iter() {
                self.record_received();
                let slot = slots.acquire();
                s.spawn(move || {
                    let _slot = slot;
                    let result = work(&item);
                    self.settle(output, item, result);
                });
                spawned += 1;
            }
            self.mark_draining();
            debug!(
                "{}: upstream closed after {} items, joining workers",
                self.name, spawned
            );
        });
    }

    pub fn report(&self) -> StageReport {
        StageReport {
            name: self.name.clone(),
            received: self.received.load(Ordering::SeqCst),
            emitted: self.emitted.load(Ordering::SeqCst),
            dropped: self.dropped.load(Ordering::SeqCst),
        }
    }
}

/// Counting semaphore over a bounded channel: one message per live worker.
struct WorkerSlots {
    taken: Sender<()>,
    freed: Receiver<()>,
}

impl WorkerSlots {
    fn new(cap: usize) -> Self {
        let (taken, freed) = bounded(cap);
        Self { taken, freed }
    }

    /// Blocks while every slot is taken.
    fn acquire(&self) -> WorkerSlot<'_> {
        // Both ends live in self, so send cannot fail.
        let _ = self.taken.send(());
        WorkerSlot(&self.freed)
    }
}

/// Frees its slot on drop, including when the worker panics.
struct WorkerSlot<'a>(&'a Receiver<()>);

impl Drop for WorkerSlot<'_> {
    fn drop(&mut self) {
        let _ = self.0.try_recv();
    }
}

/// Handles returned by [`Pipeline::spawn`](super::Pipeline::spawn): drain `output_rx`, then call
/// [`PipelineHandles::finish`].
pub struct PipelineHandles {
    pub output_rx: Receiver<Item>,
    pub stage_handles: Vec<JoinHandle<StageReport>>,
    /// Live view of each stage (state, counters) while the run is in progress.
    pub stages: Vec<Arc<StageContext>>,
    pub dropped: DropLog,
}
