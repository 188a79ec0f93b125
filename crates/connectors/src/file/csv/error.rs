use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FileError {
    #[error("File not found: {0}")]
    NotFound(String),
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("Unsupported encoding: {0}")]
    UnsupportedEncoding(String),
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("CSV parsing error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("Error writing CSV file: {0}")]
    WriteError(String),
}

impl FileError {
    /// Maps an I/O error raised while opening `path` to a more specific variant.
    pub fn open(path: &str, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => FileError::NotFound(path.to_string()),
            io::ErrorKind::PermissionDenied => FileError::PermissionDenied(path.to_string()),
            _ => FileError::IoError(err),
        }
    }
}
