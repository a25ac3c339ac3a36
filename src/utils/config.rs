//! Application configuration constants.
//! Separators, fan-out width and channel tuning in one place.

use std::sync::OnceLock;

// ---- Package / paths (from CARGO_PKG_NAME, cached) ----

/// Package-derived names: built once from `CARGO_PKG_NAME`, then cached.
pub struct PackagePaths {
    config_filename: String,
}

static PACKAGE_PATHS: OnceLock<PackagePaths> = OnceLock::new();

impl PackagePaths {
    /// Build and cache names from `CARGO_PKG_NAME`. Called once on first use.
    pub fn get() -> &'static PackagePaths {
        PACKAGE_PATHS.get_or_init(|| {
            let pkg = env!("CARGO_PKG_NAME");
            PackagePaths {
                config_filename: format!(".{pkg}.toml"),
            }
        })
    }

    /// Config file looked up in the working directory when `--config` is not given.
    pub fn config_filename(&self) -> &str {
        &self.config_filename
    }
}

// ---- Signing layout ----

/// Fixed separators and fan-out width of the three hashing stages.
pub struct SignerConsts;

impl SignerConsts {
    /// Between the fast and slow-dependent halves of a single hash.
    pub const SINGLE_HASH_SEPARATOR: &'static str = "~";
    /// Between sorted results in the combined output.
    pub const COMBINE_SEPARATOR: &'static str = "_";
    /// Number of indexed sub-digests per multi hash.
    pub const MULTI_HASH_FANOUT: usize = 6;
}

// ---- Stage names ----

pub struct StageNames;

impl StageNames {
    pub const SINGLE_HASH: &'static str = "single_hash";
    pub const MULTI_HASH: &'static str = "multi_hash";
    pub const COMBINE: &'static str = "combine";
}

// ---- Channel cap ----

/// Capacity of each inter-stage channel. Workers block on send once a hop is full, so this bounds
/// in-flight results per hop, not the number of workers.
pub struct ChannelCap;

impl ChannelCap {
    /// Default when neither config file nor CLI sets one.
    pub const DEFAULT: usize = 1024;
    /// Upper bound accepted from config (avoid huge preallocation).
    pub const MAX: usize = 1_000_000;

    /// Clamp a requested cap into `0..=MAX`. Zero is a rendezvous channel.
    pub fn resolve(requested: Option<usize>) -> usize {
        requested.unwrap_or(Self::DEFAULT).min(Self::MAX)
    }
}

// ---- Worker cap ----

/// Live per-item workers allowed per stage. Items past the cap wait in the stage coordinator until
/// a worker finishes, so OS threads stay bounded however many items are queued.
pub struct WorkerCap;

impl WorkerCap {
    /// Default when neither config file nor CLI sets one.
    pub const DEFAULT: usize = 64;
    /// Upper bound accepted from config. Each multi hash worker holds six more threads.
    pub const MAX: usize = 1024;

    /// Clamp a requested cap into `1..=MAX`.
    pub fn resolve(requested: Option<usize>) -> usize {
        requested.unwrap_or(Self::DEFAULT).clamp(1, Self::MAX)
    }
}

// ---- Diagnostics ----

/// When verbose, list at most this many dropped items on stderr before summarizing the rest.
pub const DROPPED_LIST_LIMIT: usize = 50;
