//! Signer: concurrent multi-stage signing pipeline over a stream of tokens

pub mod engine;
pub mod pipeline;
pub mod types;
pub mod utils;

/// Re-export types for API
pub use types::*;

use log::debug;
use std::sync::Arc;

use engine::hashing::HashProvider;
use pipeline::{Pipeline, check_for_dropped_items};

/// Result alias used by public signer API
pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Single entry point: run `items` through single hash -> multi hash -> combine and return the
/// combined string.
///
/// Items that fail conversion are logged, dropped, and listed in [`Signed::dropped`]; the run
/// itself always completes. With `opts.strict`, a non-empty drop list becomes an error once the
/// run has drained.
///
/// ```ignore
/// let provider = Arc::new(signer::engine::DigestProvider);
/// let signed = signer::sign_items(vec![Item::Int(0), Item::Int(1)], provider, &SignOpts::default())?;
/// println!("{}", signed.result);
/// ```
pub fn sign_items<I>(items: I, provider: Arc<dyn HashProvider>, opts: &SignOpts) -> Result<Signed>
where
    I: IntoIterator<Item = Item>,
    I::IntoIter: Send + 'static,
{
    let mut pipeline = Pipeline::signer(provider);
    if let Some(cap) = opts.channel_cap {
        pipeline = pipeline.channel_cap(cap);
    }
    if let Some(cap) = opts.worker_cap {
        pipeline = pipeline.worker_cap(cap);
    }
    debug!("stages: {:?}", pipeline.stage_names());

    let PipelineOutcome {
        outputs,
        stages,
        dropped,
    } = pipeline.run(items)?;

    let result = match <[Item; 1]>::try_from(outputs) {
        Ok([Item::Text(s)]) => s,
        Ok([other]) => anyhow::bail!("combine emitted a {} item", other.kind()),
        Err(outputs) => anyhow::bail!("combine emitted {} items, expected 1", outputs.len()),
    };
    check_for_dropped_items(opts.strict, false, &dropped)?;

    Ok(Signed {
        result,
        stages,
        dropped,
    })
}
