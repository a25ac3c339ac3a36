use anyhow::Result;
use log::warn;

use crate::DroppedItem;
use crate::utils::config::DROPPED_LIST_LIMIT;

/// Apply the drop policy after a run has fully drained: in strict mode any dropped item fails the
/// run; otherwise log a summary (and the items themselves when verbose).
pub fn check_for_dropped_items(strict: bool, verbose: bool, dropped: &[DroppedItem]) -> Result<()> {
    if dropped.is_empty() {
        return Ok(());
    }
    if strict {
        let first = &dropped[0];
        return Err(anyhow::anyhow!(
            "strict mode: {} item(s) dropped; first at {}: {}",
            dropped.len(),
            first.stage,
            first.error
        ));
    }
    warn!(
        "Dropped {} item(s) that could not be converted",
        dropped.len()
    );
    if verbose {
        for d in dropped.iter().take(DROPPED_LIST_LIMIT) {
            eprintln!("  dropped at {}: {:?} ({})", d.stage, d.item, d.error);
        }
        if dropped.len() > DROPPED_LIST_LIMIT {
            eprintln!("  ... and {} more", dropped.len() - DROPPED_LIST_LIMIT);
        }
    }
    Ok(())
}
