//! Input parsing and provider construction helpers for the CLI.

use anyhow::{Context, Result};
use std::io::BufRead;
use std::sync::Arc;
use std::time::Duration;

use crate::engine::hashing::{DigestProvider, HashProvider, IdentityProvider};
use crate::engine::instrument::InstrumentedProvider;
use crate::{Item, Opts, ProviderKind};

/// Integer-looking tokens become [`Item::Int`] (or [`Item::Uint`] past `i64::MAX`); anything else
/// is [`Item::Text`], kept verbatim.
pub fn parse_token(raw: &str) -> Item {
    if let Ok(n) = raw.parse::<i64>() {
        return Item::Int(n);
    }
    if let Ok(n) = raw.parse::<u64>() {
        return Item::Uint(n);
    }
    Item::Text(raw.to_string())
}

/// One token per line; trailing `\r` trimmed, blank lines skipped.
pub fn read_tokens<R: BufRead>(reader: R) -> Result<Vec<Item>> {
    let mut items = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("read token line {}", idx + 1))?;
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        items.push(parse_token(line));
    }
    Ok(items)
}

/// Build the provider named in `opts`, wrapped with simulated cost when any delay is set.
pub fn build_provider(opts: &Opts) -> Arc<dyn HashProvider> {
    fn wrap<P: HashProvider + 'static>(p: P, opts: &Opts) -> Arc<dyn HashProvider> {
        if opts.fast_delay_ms == 0 && opts.slow_delay_ms == 0 {
            return Arc::new(p);
        }
        Arc::new(InstrumentedProvider::new(p).with_delays(
            Duration::from_millis(opts.fast_delay_ms),
            Duration::from_millis(opts.slow_delay_ms),
        ))
    }
    match opts.provider {
        ProviderKind::Digest => wrap(DigestProvider, opts),
        ProviderKind::Identity => wrap(IdentityProvider, opts),
    }
}
