use crate::sql::{
    base::{
        adapter::{DatabaseKind, SqlAdapter},
        error::{ConnectorError, DbError},
        table::TableRef,
    },
    dialect::{self, Dialect, insert_chunks},
    postgres::utils::{bare_statement, cast_suffix, connect_client, text_param, text_rows},
};
use async_trait::async_trait;
use model::records::row::Row;
use tokio_postgres::{Client, types::ToSql};
use tracing::debug;

const CURSOR_NAME: &str = "pour_cursor";

/// PostgreSQL connection. Queries stream through a server-side cursor so
/// large tables are never held in memory at once.
pub struct PgAdapter {
    client: Client,
    cursor_open: bool,
    fetch_size: usize,
    /// Per-column casts of the last insert target.
    insert_casts: Option<(TableRef, Vec<String>)>,
}

impl PgAdapter {
    pub async fn connect(url: &str) -> Result<Self, ConnectorError> {
        let client = connect_client(url).await?;
        Ok(PgAdapter {
            client,
            cursor_open: false,
            fetch_size: 1,
            insert_casts: None,
        })
    }

    async fn close_cursor(&mut self) -> Result<(), DbError> {
        if self.cursor_open {
            self.cursor_open = false;
            self.client
                .batch_execute(&format!("CLOSE {CURSOR_NAME}; COMMIT"))
                .await?;
        }
        Ok(())
    }

    /// Asks the server for the column types of `table` by preparing a
    /// one-row insert, and turns them into `::text::<type>` casts.
    async fn insert_casts(&mut self, table: &TableRef) -> Result<Vec<String>, DbError> {
        if let Some((cached, casts)) = &self.insert_casts {
            if cached == table {
                return Ok(casts.clone());
            }
        }
        let single_row = dialect::Postgres.insert_statement(table, 1, &[])?;
        let statement = self.client.prepare(&single_row).await?;
        let casts = statement.params().iter().map(cast_suffix).collect::<Vec<_>>();
        debug!(table = %table.name, casts = ?casts, "Resolved insert column types");
        self.insert_casts = Some((table.clone(), casts.clone()));
        Ok(casts)
    }
}

#[async_trait]
impl SqlAdapter for PgAdapter {
    fn kind(&self) -> DatabaseKind {
        DatabaseKind::Postgres
    }

    fn dialect(&self) -> &'static dyn Dialect {
        &dialect::Postgres
    }

    async fn open_query(&mut self, sql: &str, fetch_size: usize) -> Result<(), DbError> {
        self.close_cursor().await?;
        let declare = format!(
            "BEGIN; DECLARE {CURSOR_NAME} NO SCROLL CURSOR FOR {}",
            bare_statement(sql)
        );
        debug!(sql = %declare, "Opening cursor");
        self.client.batch_execute(&declare).await?;
        self.cursor_open = true;
        self.fetch_size = fetch_size.max(1);
        Ok(())
    }

    async fn fetch_rows(&mut self) -> Result<Vec<Row>, DbError> {
        if !self.cursor_open {
            return Ok(Vec::new());
        }
        let messages = self
            .client
            .simple_query(&format!("FETCH FORWARD {} FROM {CURSOR_NAME}", self.fetch_size))
            .await?;
        let rows = text_rows(messages);
        if rows.len() < self.fetch_size {
            self.close_cursor().await?;
        }
        Ok(rows)
    }

    async fn insert_rows(&mut self, table: &TableRef, rows: &[Row]) -> Result<(), DbError> {
        let casts = self.insert_casts(table).await?;
        let tx = self.client.transaction().await?;
        for chunk in insert_chunks(rows, table.columns.len()) {
            let sql = dialect::Postgres.insert_statement(table, chunk.len(), &casts)?;
            let params = chunk.iter().flatten().map(text_param).collect::<Vec<_>>();
            let refs = params
                .iter()
                .map(|param| param as &(dyn ToSql + Sync))
                .collect::<Vec<_>>();
            tx.execute(sql.as_str(), &refs).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn exec_in_transaction(&mut self, sql: &str) -> Result<(), DbError> {
        let tx = self.client.transaction().await?;
        tx.batch_execute(sql).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), DbError> {
        if self.cursor_open {
            self.cursor_open = false;
            self.client.batch_execute("ROLLBACK").await?;
        }
        Ok(())
    }
}
