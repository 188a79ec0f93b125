pub mod batch;
pub mod error;
pub mod metrics;
pub mod options;
pub mod progress;
pub mod projector;
pub mod range;
pub mod step;
pub mod transformer;
