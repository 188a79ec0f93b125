use crate::{
    error::AdapterError,
    sql::{
        base::{adapter::SqlAdapter, error::ConnectorError},
        dialect::Dialect,
        mysql::adapter::MySqlAdapter,
        postgres::adapter::PgAdapter,
    },
};
use tracing::debug;

pub mod base;
pub mod dialect;
pub mod insert;
pub mod mysql;
pub mod postgres;
pub mod select;

/// Database driver selected by the URI scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Driver {
    Postgres,
    MySql,
}

impl Driver {
    pub fn from_uri(uri: &str) -> Result<Self, AdapterError> {
        let parsed = url::Url::parse(uri)
            .map_err(|err| ConnectorError::InvalidUrl(format!("{uri}: {err}")))?;
        match parsed.scheme() {
            "postgres" | "postgresql" => Ok(Driver::Postgres),
            "mysql" => Ok(Driver::MySql),
            other => Err(AdapterError::UnsupportedDriver(other.to_string())),
        }
    }

    pub fn dialect(self) -> &'static dyn Dialect {
        match self {
            Driver::Postgres => &dialect::Postgres,
            Driver::MySql => &dialect::MySql,
        }
    }

    pub async fn connect(self, uri: &str) -> Result<Box<dyn SqlAdapter>, AdapterError> {
        debug!(driver = ?self, "Connecting");
        let adapter: Box<dyn SqlAdapter> = match self {
            Driver::Postgres => Box::new(PgAdapter::connect(uri).await?),
            Driver::MySql => Box::new(MySqlAdapter::connect(uri).await?),
        };
        Ok(adapter)
    }
}
