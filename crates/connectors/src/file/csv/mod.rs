pub mod error;
pub mod settings;
pub mod sink;
pub mod source;

/// URI selecting stdin for readers and stdout for writers.
pub const STDIO_URI: &str = "-";
