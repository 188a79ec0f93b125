pub mod adapter;
pub(crate) mod utils;
