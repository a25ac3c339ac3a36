//! Stage trait and closure-backed stages.

use crossbeam_channel::{Receiver, Sender};

use super::context::StageContext;
use crate::Item;

/// One phase of a pipeline. `run` reads `input` until it is closed and writes results to
/// `output`. It must not return until every worker it spawned has finished; the executor closes
/// `output` as soon as `run` returns.
pub trait Stage: Send + Sync {
    fn name(&self) -> &str;
    fn run(&self, input: &Receiver<Item>, output: &Sender<Item>, ctx: &StageContext);
}

/// Stage backed by a closure. See [`stage_fn`].
pub struct FnStage<F> {
    name: String,
    f: F,
}

impl<F> Stage for FnStage<F>
where
    F: Fn(&Receiver<Item>, &Sender<Item>, &StageContext) + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, input: &Receiver<Item>, output: &Sender<Item>, ctx: &StageContext) {
        (self.f)(input, output, ctx)
    }
}

/// Build a stage from a closure, e.g. an ad-hoc transform in front of the hashing stages:
///
/// ```ignore
/// let doubled = stage_fn("double", |input, output, ctx| {
///     for item in input.iter() {
///         ctx.record_received();
///         let out = match item {
///             Item::Int(n) => Item::Int(n * 2),
///             other => other,
///         };
///         ctx.emit(output, out);
///     }
/// });
/// ```
pub fn stage_fn<F>(name: impl Into<String>, f: F) -> FnStage<F>
where
    F: Fn(&Receiver<Item>, &Sender<Item>, &StageContext) + Send + Sync,
{
    FnStage {
        name: name.into(),
        f,
    }
}
