pub mod execution;
pub mod registry;
