use crate::{
    file::csv::error::FileError,
    sql::base::error::{ConnectorError, DbError},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    /// A required factory argument was not supplied.
    #[error("\"{name}\" argument is not specified in {scope} arguments: {args}")]
    MissingArgument {
        name: String,
        scope: &'static str,
        args: String,
    },

    /// A factory argument was supplied but cannot be used.
    #[error("Invalid value for argument \"{name}\": {message}")]
    InvalidArgument { name: String, message: String },

    /// The URI names a database driver that is not supported.
    #[error("Unsupported driver: {0}")]
    UnsupportedDriver(String),

    /// File-related error.
    #[error("File error: {0}")]
    File(#[from] FileError),

    /// Database-related error.
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    /// Failed to establish a database connection.
    #[error("Connector error: {0}")]
    Connector(#[from] ConnectorError),

    /// A field converter rejected its input.
    #[error("Failed to convert field: {0}")]
    Conversion(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize row: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The adapter was used outside of its acquisition scope.
    #[error("Resource is not acquired: {0}")]
    NotAcquired(String),

    /// Generic adapter error, used by custom adapters.
    #[error("Adapter error: {0}")]
    Generic(String),
}

impl AdapterError {
    pub fn invalid(name: impl Into<String>, message: impl Into<String>) -> Self {
        AdapterError::InvalidArgument {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Whether the error stems from how the adapter was configured rather
    /// than from the data or the remote system.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            AdapterError::MissingArgument { .. }
                | AdapterError::InvalidArgument { .. }
                | AdapterError::UnsupportedDriver(_)
                | AdapterError::Connector(ConnectorError::InvalidUrl(_))
                | AdapterError::File(FileError::UnsupportedEncoding(_))
        )
    }
}
