//! CLI command handler: gather tokens, run the signing pipeline, print the result.

use anyhow::Result;
use log::debug;
use std::io;

use crate::Opts;
use crate::engine::arg_parser::Cli;
use crate::engine::tools::{build_provider, parse_token, read_tokens};
use crate::pipeline::check_for_dropped_items;
use crate::utils::{apply_file_to_opts, load_signer_toml, setup_logging};
use crate::{Item, SignOpts, Signed, sign_items};

/// Defaults < config file < CLI flags.
fn setup_opts(cli: &Cli) -> Opts {
    let mut opts = Opts::default();
    let config_path = cli.config_path();
    let file = load_signer_toml(&config_path);
    if let Some(ref file) = file {
        apply_file_to_opts(file, &mut opts);
    }
    if let Some(p) = cli.provider {
        opts.provider = p;
    }
    if cli.channel_cap.is_some() {
        opts.channel_cap = cli.channel_cap;
    }
    if cli.worker_cap.is_some() {
        opts.worker_cap = cli.worker_cap;
    }
    if let Some(ms) = cli.fast_delay_ms {
        opts.fast_delay_ms = ms;
    }
    if let Some(ms) = cli.slow_delay_ms {
        opts.slow_delay_ms = ms;
    }
    if let Some(v) = cli.strict {
        opts.strict = v;
    }
    if let Some(v) = cli.json {
        opts.json = v;
    }
    if let Some(v) = cli.verbose {
        opts.verbose = v;
    }
    setup_logging(opts.verbose);
    if file.is_some() {
        debug!("Loaded config from {}", config_path.display());
    }
    opts
}

fn collect_items(cli: &Cli) -> Result<Vec<Item>> {
    let mut items: Vec<Item> = cli.tokens.iter().map(|t| parse_token(t)).collect();
    if cli.stdin {
        items.extend(read_tokens(io::stdin().lock())?);
    }
    Ok(items)
}

/// JSON report: result, per-stage counts, dropped items.
pub fn signed_to_json(signed: &Signed) -> serde_json::Value {
    let dropped: Vec<serde_json::Value> = signed
        .dropped
        .iter()
        .map(|d| {
            serde_json::json!({
                "stage": d.stage,
                "item": d.item,
                "error": d.error.to_string(),
            })
        })
        .collect();
    serde_json::json!({
        "result": signed.result,
        "stages": signed.stages,
        "dropped": dropped,
    })
}

/// Run the pipeline over CLI tokens. The drop policy is applied after the run has drained.
pub fn handle_run(cli: &Cli) -> Result<()> {
    let opts = setup_opts(cli);
    debug!("{} CONFIG:{:#?}", env!("CARGO_PKG_NAME").to_uppercase(), opts);

    let items = collect_items(cli)?;
    debug!("Signing {} token(s)...", items.len());

    let provider = build_provider(&opts);
    // Strictness is checked below so the report still prints first.
    let sign_opts = SignOpts {
        strict: false,
        ..SignOpts::from(&opts)
    };
    let signed = sign_items(items, provider, &sign_opts)?;

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&signed_to_json(&signed))?);
    } else {
        println!("{}", signed.result);
    }
    for s in &signed.stages {
        debug!(
            "{}: received {}, emitted {}, dropped {}",
            s.name, s.received, s.emitted, s.dropped
        );
    }
    check_for_dropped_items(opts.strict, opts.verbose, &signed.dropped)
}
