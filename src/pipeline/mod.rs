//! Pipeline components: executor, stage contract, slow-digest gate, and the three hashing stages.

pub mod combine;
pub mod context;
pub mod error_handler;
pub mod feed;
pub mod gate;
pub mod multi_hash;
pub mod orchestrator;
pub mod single_hash;
pub mod stage;

pub use combine::{CombineStage, combine_results};
pub use context::{DropLog, PipelineHandles, StageContext, StageState};
pub use error_handler::check_for_dropped_items;
pub use feed::{run_feed_loop, spawn_feed_thread};
pub use gate::{Signer, SlowDigestGate};
pub use multi_hash::{MultiHashStage, multi_hash};
pub use orchestrator::Pipeline;
pub use single_hash::{SingleHashStage, single_hash};
pub use stage::{FnStage, Stage, stage_fn};
