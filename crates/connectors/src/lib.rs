pub mod adapter;
pub mod args;
pub mod codec;
pub mod convert;
pub mod count;
pub mod empty;
pub mod error;
pub mod file;
pub mod sql;
pub mod stdio;
