pub mod batch;
pub mod row;
