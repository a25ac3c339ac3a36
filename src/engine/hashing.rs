//! Hash providers: the digest capability the signing stages call into.

use xxhash_rust::xxh3::xxh3_64;

/// Two synchronous digests. `fast_digest` may run on any number of threads at once;
/// `slow_digest` must only be entered by one caller at a time, which the pipeline enforces with
/// its [`SlowDigestGate`](crate::pipeline::SlowDigestGate). Both are assumed to always succeed.
pub trait HashProvider: Send + Sync {
    fn fast_digest(&self, data: &str) -> String;
    fn slow_digest(&self, data: &str) -> String;
}

/// XXH3-64 as decimal for the fast digest, BLAKE3 as lowercase hex for the slow digest.
#[derive(Clone, Copy, Debug, Default)]
pub struct DigestProvider;

impl HashProvider for DigestProvider {
    fn fast_digest(&self, data: &str) -> String {
        xxh3_64(data.as_bytes()).to_string()
    }

    fn slow_digest(&self, data: &str) -> String {
        blake3::hash(data.as_bytes()).to_hex().to_string()
    }
}

/// Returns its input from both digests. Makes pipeline output fully predictable.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityProvider;

impl HashProvider for IdentityProvider {
    fn fast_digest(&self, data: &str) -> String {
        data.to_string()
    }

    fn slow_digest(&self, data: &str) -> String {
        data.to_string()
    }
}
