pub mod error;
pub mod hourly_stats;
pub mod loader;
pub mod outputs;
pub mod pipeline;
pub mod stats;
pub mod transfer_flow;
pub mod wait_times;

pub use error::{PipelineError, Result};
pub use pipeline::{run_pipeline, ProcessedBundle};
