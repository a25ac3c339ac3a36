use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, Sender, bounded};
use log::debug;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crate::engine::hashing::HashProvider;
use crate::utils::config::{ChannelCap, WorkerCap};
use crate::{DroppedItem, Item, PipelineOutcome, StageReport};

use super::combine::CombineStage;
use super::context::{DropLog, PipelineHandles, StageContext};
use super::feed::spawn_feed_thread;
use super::gate::{Signer, SlowDigestGate};
use super::multi_hash::MultiHashStage;
use super::single_hash::SingleHashStage;
use super::stage::Stage;

/// Generic N-stage executor. Owns no hashing logic: it wires stages with channels, runs one
/// coordinator thread per stage, and closes each downstream channel only after that stage's
/// `run` (and so every worker it spawned) has returned.
pub struct Pipeline {
    provider: Arc<dyn HashProvider>,
    stages: Vec<Arc<dyn Stage>>,
    channel_cap: usize,
    worker_cap: usize,
    gate: Option<Arc<SlowDigestGate>>,
}

impl Pipeline {
    /// Empty pipeline; output equals input until stages are added.
    pub fn new(provider: Arc<dyn HashProvider>) -> Self {
        Self {
            provider,
            stages: Vec::new(),
            channel_cap: ChannelCap::DEFAULT,
            worker_cap: WorkerCap::DEFAULT,
            gate: None,
        }
    }

    /// Single hash -> multi hash -> combine.
    pub fn signer(provider: Arc<dyn HashProvider>) -> Self {
        Self::new(provider)
            .stage(SingleHashStage)
            .stage(MultiHashStage)
            .stage(CombineStage)
    }

    pub fn stage<S: Stage + 'static>(mut self, stage: S) -> Self {
        self.stages.push(Arc::new(stage));
        self
    }

    pub fn channel_cap(mut self, cap: usize) -> Self {
        self.channel_cap = ChannelCap::resolve(Some(cap));
        self
    }

    /// Most per-item workers alive at once in each stage.
    pub fn worker_cap(mut self, cap: usize) -> Self {
        self.worker_cap = WorkerCap::resolve(Some(cap));
        self
    }

    /// Share a gate across runs. Without one, each run gets its own.
    pub fn with_gate(mut self, gate: Arc<SlowDigestGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Start every stage reading from `input_rx`. The caller drains `output_rx` and then calls
    /// [`PipelineHandles::finish`].
    pub fn spawn(&self, input_rx: Receiver<Item>) -> Result<PipelineHandles> {
        let gate = self
            .gate
            .clone()
            .unwrap_or_else(|| Arc::new(SlowDigestGate::new()));
        let signer = Signer::with_gate(Arc::clone(&self.provider), gate);
        let dropped: DropLog = Arc::new(Mutex::new(Vec::new()));

        let mut upstream = input_rx;
        let mut stage_handles = Vec::with_capacity(self.stages.len());
        let mut contexts = Vec::with_capacity(self.stages.len());
        for stage in &self.stages {
            let (tx, rx) = bounded::<Item>(self.channel_cap);
            let ctx = Arc::new(StageContext::new(
                stage.name(),
                signer.clone(),
                Arc::clone(&dropped),
                self.worker_cap,
            ));
            let handle = spawn_stage_thread(Arc::clone(stage), Arc::clone(&ctx), upstream, tx)?;
            stage_handles.push(handle);
            contexts.push(ctx);
            upstream = rx;
        }
        debug!(
            "pipeline: {} stage(s) running, channel cap {}, worker cap {}",
            self.stages.len(),
            self.channel_cap,
            self.worker_cap
        );

        Ok(PipelineHandles {
            output_rx: upstream,
            stage_handles,
            stages: contexts,
            dropped,
        })
    }

    /// Feed `items`, drain the final output, and join everything.
    pub fn run<I>(&self, items: I) -> Result<PipelineOutcome>
    where
        I: IntoIterator<Item = Item>,
        I::IntoIter: Send + 'static,
    {
        let (input_tx, input_rx) = bounded::<Item>(self.channel_cap);
        let handles = self.spawn(input_rx)?;
        let feed_handle = spawn_feed_thread(items, input_tx).context("spawn feed thread")?;

        let outputs: Vec<Item> = handles.output_rx.iter().collect();
        debug!("pipeline: output closed, {} item(s) drained", outputs.len());

        feed_handle
            .join()
            .map_err(|_| anyhow::anyhow!("feed thread panicked"))?;
        let (stages, dropped) = handles.finish()?;
        Ok(PipelineOutcome {
            outputs,
            stages,
            dropped,
        })
    }
}

/// One coordinator per stage: run it, then (only after `run` returned) close downstream.
fn spawn_stage_thread(
    stage: Arc<dyn Stage>,
    ctx: Arc<StageContext>,
    input: Receiver<Item>,
    output: Sender<Item>,
) -> Result<JoinHandle<StageReport>> {
    let name = stage.name().to_string();
    thread::Builder::new()
        .name(format!("stage-{name}"))
        .spawn(move || {
            stage.run(&input, &output, &ctx);
            ctx.mark_draining();
            drop(output);
            ctx.mark_closed();
            ctx.report()
        })
        .with_context(|| format!("spawn coordinator for stage {name}"))
}

impl PipelineHandles {
    /// Join every stage coordinator and collect reports and drops.
    ///
    /// Drops `output_rx` first: anything the caller did not drain is discarded, so stages blocked
    /// on a full channel can still finish.
    pub fn finish(self) -> Result<(Vec<StageReport>, Vec<DroppedItem>)> {
        let PipelineHandles {
            output_rx,
            stage_handles,
            stages: _,
            dropped,
        } = self;
        drop(output_rx);

        let mut reports = Vec::with_capacity(stage_handles.len());
        for h in stage_handles {
            let report = h
                .join()
                .map_err(|_| anyhow::anyhow!("stage thread panicked"))?;
            reports.push(report);
        }
        let dropped = std::mem::take(&mut *dropped.lock().unwrap_or_else(|e| e.into_inner()));
        Ok((reports, dropped))
    }
}
