//! Second hashing stage: six indexed fast digests per item, concatenated in index order.

use crossbeam_channel::{Receiver, Sender};
use std::panic;
use std::thread;

use super::context::StageContext;
use super::gate::Signer;
use super::stage::Stage;
use crate::Item;
use crate::utils::config::{SignerConsts, StageNames};

/// `fast("0" + data) + fast("1" + data) + ... + fast("5" + data)`.
///
/// Each index gets its own thread; the handles are joined in index order, so completion order
/// never affects the result.
pub fn multi_hash(signer: &Signer, data: &str) -> String {
    thread::scope(|s| {
        let handles: Vec<_> = (0..SignerConsts::MULTI_HASH_FANOUT)
            .map(|i| s.spawn(move || signer.fast(&format!("{i}{data}"))))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|e| panic::resume_unwind(e)))
            .collect()
    })
}

/// Accepts text items only; one coordinating worker per item.
#[derive(Clone, Copy, Debug, Default)]
pub struct MultiHashStage;

impl Stage for MultiHashStage {
    fn name(&self) -> &str {
        StageNames::MULTI_HASH
    }

    fn run(&self, input: &Receiver<Item>, output: &Sender<Item>, ctx: &StageContext) {
        ctx.spawn_per_item(input, output, |item| {
            let data = item.as_text()?;
            Ok(Item::Text(multi_hash(ctx.signer(), data)))
        });
    }
}
