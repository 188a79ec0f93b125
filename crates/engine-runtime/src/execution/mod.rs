pub mod count;
pub mod executor;
pub mod summary;

pub use executor::{PipelineExecutor, run};
pub use summary::RunSummary;
