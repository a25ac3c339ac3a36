//! Public and internal types for the signer API and pipeline.

use serde::Serialize;
use thiserror::Error;

/// Unit flowing between stages. Before the first stage it is any token-like value; after each
/// stage it is that stage's output text.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Item {
    Int(i64),
    Uint(u64),
    Text(String),
    Bytes(Vec<u8>),
    Float(f64),
}

/// Raised when an item cannot be coerced to the shape a stage expects. Never fatal: the stage
/// logs it, records a [`DroppedItem`], and moves on.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConversionError {
    #[error("expected {expected}, got {found}")]
    Unsupported {
        expected: &'static str,
        found: &'static str,
    },
    #[error("bytes are not valid UTF-8: {0}")]
    InvalidUtf8(String),
}

impl Item {
    /// Variant name, used in conversion errors and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Item::Int(_) => "int",
            Item::Uint(_) => "uint",
            Item::Text(_) => "text",
            Item::Bytes(_) => "bytes",
            Item::Float(_) => "float",
        }
    }

    /// Canonical token text for the first hashing stage.
    ///
    /// Integers render as decimal, text as itself, bytes only when valid UTF-8. Floats have no
    /// canonical token form (`1`, `1.0` and `1e0` would all be candidates) and are rejected.
    pub fn to_token(&self) -> Result<String, ConversionError> {
        match self {
            Item::Int(n) => Ok(n.to_string()),
            Item::Uint(n) => Ok(n.to_string()),
            Item::Text(s) => Ok(s.clone()),
            Item::Bytes(b) => std::str::from_utf8(b)
                .map(str::to_string)
                .map_err(|e| ConversionError::InvalidUtf8(e.to_string())),
            Item::Float(_) => Err(self.unsupported("token")),
        }
    }

    /// Borrow the text of a `Text` item; anything else is a conversion error.
    pub fn as_text(&self) -> Result<&str, ConversionError> {
        match self {
            Item::Text(s) => Ok(s),
            other => Err(other.unsupported("text")),
        }
    }

    /// Owned variant of [`Item::as_text`].
    pub fn into_text(self) -> Result<String, ConversionError> {
        match self {
            Item::Text(s) => Ok(s),
            other => Err(other.unsupported("text")),
        }
    }

    /// Error for this item not being convertible to `expected`.
    pub fn unsupported(&self, expected: &'static str) -> ConversionError {
        ConversionError::Unsupported {
            expected,
            found: self.kind(),
        }
    }
}

impl From<String> for Item {
    fn from(s: String) -> Self {
        Item::Text(s)
    }
}

impl From<&str> for Item {
    fn from(s: &str) -> Self {
        Item::Text(s.to_string())
    }
}

impl From<i64> for Item {
    fn from(n: i64) -> Self {
        Item::Int(n)
    }
}

impl From<u64> for Item {
    fn from(n: u64) -> Self {
        Item::Uint(n)
    }
}

/// An item a stage refused, with the stage name and reason.
#[derive(Clone, Debug, PartialEq)]
pub struct DroppedItem {
    pub stage: String,
    pub item: Item,
    pub error: ConversionError,
}

/// Per-stage accounting after a run. For per-item stages `received == emitted + dropped`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StageReport {
    pub name: String,
    pub received: usize,
    pub emitted: usize,
    pub dropped: usize,
}

/// Everything a finished run hands back: the drained output, per-stage reports, and drops.
#[derive(Clone, Debug, Default)]
pub struct PipelineOutcome {
    pub outputs: Vec<Item>,
    pub stages: Vec<StageReport>,
    pub dropped: Vec<DroppedItem>,
}

/// Result of [`sign_items`](crate::sign_items): the combined string plus run details.
#[derive(Clone, Debug, Default)]
pub struct Signed {
    pub result: String,
    pub stages: Vec<StageReport>,
    pub dropped: Vec<DroppedItem>,
}

/// Which built-in hash provider to use.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// XXH3 fast digest, BLAKE3 slow digest.
    #[default]
    Digest,
    /// Both digests return their input unchanged.
    Identity,
}

/// Lib-only options for [`sign_items`](crate::sign_items).
#[derive(Clone, Debug, Default)]
pub struct SignOpts {
    /// Capacity of each inter-stage channel. When None, uses [`ChannelCap::DEFAULT`](crate::utils::config::ChannelCap::DEFAULT).
    pub channel_cap: Option<usize>,
    /// Live per-item workers per stage. When None, uses [`WorkerCap::DEFAULT`](crate::utils::config::WorkerCap::DEFAULT).
    pub worker_cap: Option<usize>,
    /// Strict mode: fail after the run drains if any item was dropped.
    pub strict: bool,
}

impl From<&Opts> for SignOpts {
    fn from(o: &Opts) -> Self {
        SignOpts {
            channel_cap: o.channel_cap,
            worker_cap: o.worker_cap,
            strict: o.strict,
        }
    }
}

/// Full options (CLI). Use [`SignOpts`] for lib.
#[derive(Clone, Debug, Default)]
pub struct Opts {
    /// Hash provider backing the pipeline.
    pub provider: ProviderKind,
    /// Capacity of each inter-stage channel.
    pub channel_cap: Option<usize>,
    /// Live per-item workers per stage.
    pub worker_cap: Option<usize>,
    /// Simulated cost added to every fast digest call, in milliseconds.
    pub fast_delay_ms: u64,
    /// Simulated cost added to every slow digest call, in milliseconds.
    pub slow_delay_ms: u64,
    /// Strict mode: fail after the run drains if any item was dropped.
    pub strict: bool,
    /// Print a JSON report instead of the bare result.
    pub json: bool,
    /// Debug logging and dropped-item listing.
    pub verbose: bool,
}
