pub mod config;
pub mod logger;
pub mod signer_toml;

pub use config::*;
pub use logger::setup_logging;
pub use signer_toml::{SignerToml, apply_file_to_opts, load_signer_toml};
