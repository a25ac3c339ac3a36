//! First hashing stage: `fast(token) ~ fast(slow(token))` per item.

use crossbeam_channel::{Receiver, Sender};
use std::panic;
use std::thread;

use super::context::StageContext;
use super::gate::Signer;
use super::stage::Stage;
use crate::Item;
use crate::utils::config::{SignerConsts, StageNames};

/// Hash one token. The fast digest runs on its own thread while this thread waits on the gate for
/// the slow digest; the outer fast digest of the slow result runs after the gate is released.
/// Output order is fixed (fast first) no matter which half finishes first.
pub fn single_hash(signer: &Signer, token: &str) -> String {
    thread::scope(|s| {
        let fast = s.spawn(|| signer.fast(token));
        let slow = signer.fast(&signer.slow(token));
        let fast = fast.join().unwrap_or_else(|e| panic::resume_unwind(e));
        format!("{fast}{}{slow}", SignerConsts::SINGLE_HASH_SEPARATOR)
    })
}

/// Converts each item to its token and spawns one worker per item.
#[derive(Clone, Copy, Debug, Default)]
pub struct SingleHashStage;

impl Stage for SingleHashStage {
    fn name(&self) -> &str {
        StageNames::SINGLE_HASH
    }

    fn run(&self, input: &Receiver<Item>, output: &Sender<Item>, ctx: &StageContext) {
        ctx.spawn_per_item(input, output, |item| {
            let token = item.to_token()?;
            Ok(Item::Text(single_hash(ctx.signer(), &token)))
        });
    }
}
