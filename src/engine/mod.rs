//! Engine module: hash providers and the CLI surface around the pipeline

pub mod arg_parser;
pub mod cli;
pub mod hashing;
pub mod instrument;
pub mod tools;

// Re-export commonly used items
pub use arg_parser::Cli;
pub use cli::{handle_run, signed_to_json};
pub use hashing::{DigestProvider, HashProvider, IdentityProvider};
pub use instrument::{InstrumentedProvider, ProviderStats};
pub use tools::{build_provider, parse_token, read_tokens};
