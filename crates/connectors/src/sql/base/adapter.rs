use crate::sql::{
    base::{error::DbError, table::TableRef},
    dialect::Dialect,
};
use async_trait::async_trait;
use model::records::row::Row;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseKind {
    MySql,
    Postgres,
}

/// A single database connection driven by the select and insert adapters.
///
/// Result values are fetched as text so any column type can be poured
/// without knowing the schema.
#[async_trait]
pub trait SqlAdapter: Send {
    fn kind(&self) -> DatabaseKind;

    fn dialect(&self) -> &'static dyn Dialect;

    /// Starts executing `sql`; rows are then pulled with [`SqlAdapter::fetch_rows`].
    async fn open_query(&mut self, sql: &str, fetch_size: usize) -> Result<(), DbError>;

    /// Returns up to `fetch_size` rows of the open query. An empty result
    /// means the query is exhausted.
    async fn fetch_rows(&mut self) -> Result<Vec<Row>, DbError>;

    /// Inserts `rows` into the columns of `table` in one transaction. Values
    /// travel as bound parameters, never as SQL text.
    async fn insert_rows(&mut self, table: &TableRef, rows: &[Row]) -> Result<(), DbError>;

    /// Runs `sql` inside its own transaction and commits it.
    async fn exec_in_transaction(&mut self, sql: &str) -> Result<(), DbError>;

    /// Abandons any open query and closes the connection.
    async fn close(&mut self) -> Result<(), DbError>;
}
