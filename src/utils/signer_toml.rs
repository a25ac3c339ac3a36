//! Load `.signer.toml` (CLI only). Lib does not use this; the consuming program passes SignOpts.

use serde::Deserialize;
use std::path::Path;

use crate::{Opts, ProviderKind};

#[derive(Debug, Default, Deserialize)]
pub struct SignerToml {
    #[serde(default)]
    settings: SettingsSection,
}

#[derive(Debug, Default, Deserialize)]
struct SettingsSection {
    provider: Option<ProviderKind>,
    channel_cap: Option<usize>,
    worker_cap: Option<usize>,
    fast_delay_ms: Option<u64>,
    slow_delay_ms: Option<u64>,
    strict: Option<bool>,
    json: Option<bool>,
    verbose: Option<bool>,
}

/// Load a config file from `path`. Returns None if the file is missing or unreadable; a parse
/// error is logged and also yields None.
pub fn load_signer_toml(path: &Path) -> Option<SignerToml> {
    let s = std::fs::read_to_string(path).ok()?;
    toml::from_str(&s)
        .map_err(|e| log::warn!("{}: {}", path.display(), e))
        .ok()
}

/// Overwrite opts field from file when present.
macro_rules! apply_file_opt {
    ($sec:expr, $opts:expr, $sec_field:ident => $opts_field:ident) => {
        if let Some(v) = $sec.$sec_field {
            $opts.$opts_field = v;
        }
    };
}

/// Apply file config to opts (only fields present in the file). Call before applying CLI flags.
pub fn apply_file_to_opts(file: &SignerToml, opts: &mut Opts) {
    let sec = &file.settings;
    apply_file_opt!(sec, opts, provider => provider);
    if sec.channel_cap.is_some() {
        opts.channel_cap = sec.channel_cap;
    }
    if sec.worker_cap.is_some() {
        opts.worker_cap = sec.worker_cap;
    }
    apply_file_opt!(sec, opts, fast_delay_ms => fast_delay_ms);
    apply_file_opt!(sec, opts, slow_delay_ms => slow_delay_ms);
    apply_file_opt!(sec, opts, strict => strict);
    apply_file_opt!(sec, opts, json => json);
    apply_file_opt!(sec, opts, verbose => verbose);
}
