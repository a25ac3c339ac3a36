//! Terminal stage: collect everything, sort, join.

use crossbeam_channel::{Receiver, Sender};
use log::debug;
use rayon::prelude::*;

use super::context::StageContext;
use super::stage::Stage;
use crate::Item;
use crate::utils::config::{SignerConsts, StageNames};

/// Sort by byte order and join with `_`. Empty input gives the empty string.
pub fn combine_results(mut parts: Vec<String>) -> String {
    parts.par_sort_unstable();
    parts.join(SignerConsts::COMBINE_SEPARATOR)
}

/// Reads upstream until closed, then emits exactly one text item.
#[derive(Clone, Copy, Debug, Default)]
pub struct CombineStage;

impl Stage for CombineStage {
    fn name(&self) -> &str {
        StageNames::COMBINE
    }

    fn run(&self, input: &Receiver<Item>, output: &Sender<Item>, ctx: &StageContext) {
        let mut parts = Vec::new();
        for item in input.iter() {
            ctx.record_received();
            match item {
                Item::Text(s) => parts.push(s),
                other => {
                    let err = other.unsupported("text");
                    ctx.drop_item(other, err);
                }
            }
        }
        ctx.mark_draining();
        debug!("{}: combining {} results", ctx.name(), parts.len());
        ctx.emit(output, Item::Text(combine_results(parts)));
    }
}
