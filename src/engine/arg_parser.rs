use clap::Parser;
use std::path::PathBuf;

use crate::ProviderKind;
use crate::utils::config::PackagePaths;

/// Concurrent signing pipeline: single hash -> multi hash -> combine.
#[derive(Clone, Parser)]
#[command(name = "signer")]
#[command(about = "Sign tokens through the single/multi/combine hash pipeline and print the combined result.")]
pub struct Cli {
    /// Tokens to sign. Integers are signed as numbers, anything else as text.
    #[arg(value_name = "TOKENS")]
    pub tokens: Vec<String>,

    /// Read tokens from stdin, one per line (blank lines skipped). Appended after TOKENS.
    #[arg(long)]
    pub stdin: bool,

    /// Config file. Default: `.signer.toml` in the current directory, if present.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Hash provider backing the pipeline.
    #[arg(long, short = 'p', value_enum)]
    pub provider: Option<ProviderKind>,

    /// Capacity of each inter-stage channel (0 = rendezvous).
    #[arg(long, value_parser = clap::value_parser!(usize))]
    pub channel_cap: Option<usize>,

    /// Most per-item workers alive at once in each stage.
    #[arg(long, value_parser = clap::value_parser!(usize))]
    pub worker_cap: Option<usize>,

    /// Simulated cost of every fast digest call, in milliseconds.
    #[arg(long, value_parser = clap::value_parser!(u64))]
    pub fast_delay_ms: Option<u64>,

    /// Simulated cost of every slow digest call, in milliseconds.
    #[arg(long, value_parser = clap::value_parser!(u64))]
    pub slow_delay_ms: Option<u64>,

    /// Strict mode: exit with an error if any item was dropped (after the run completes).
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub strict: Option<bool>,

    /// Print a JSON report (result, per-stage counts, dropped items).
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub json: Option<bool>,

    /// Verbose output.
    #[arg(long, short = 'v', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub verbose: Option<bool>,
}

impl Cli {
    /// Config path: `--config`, else package config filename in the current directory.
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| PathBuf::from(PackagePaths::get().config_filename()))
    }
}
