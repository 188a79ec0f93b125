use crate::sql::{
    base::{
        adapter::{DatabaseKind, SqlAdapter},
        error::{ConnectorError, DbError},
        table::TableRef,
    },
    dialect::{self, Dialect, insert_chunks},
};
use async_trait::async_trait;
use model::{core::value::Value, records::row::Row};
use mysql_async::{Conn, Opts, Params, TxOpts, prelude::Queryable};
use std::collections::VecDeque;
use tracing::debug;

/// MySQL connection. Each query result is buffered and handed out in
/// `fetch_size` chunks.
pub struct MySqlAdapter {
    conn: Option<Conn>,
    pending: VecDeque<Row>,
    fetch_size: usize,
}

impl MySqlAdapter {
    pub async fn connect(url: &str) -> Result<Self, ConnectorError> {
        let opts = Opts::from_url(url)?;
        let conn = Conn::new(opts).await?;
        Ok(MySqlAdapter {
            conn: Some(conn),
            pending: VecDeque::new(),
            fetch_size: 1,
        })
    }

    fn conn(&mut self) -> Result<&mut Conn, DbError> {
        self.conn
            .as_mut()
            .ok_or_else(|| DbError::Write("connection is closed".to_string()))
    }
}

fn text_value(value: mysql_async::Value) -> Value {
    use mysql_async::Value as My;
    match value {
        My::NULL => Value::Null,
        My::Bytes(bytes) => match String::from_utf8(bytes) {
            Ok(text) => Value::String(text),
            Err(err) => Value::Bytes(err.into_bytes()),
        },
        My::Int(v) => Value::String(v.to_string()),
        My::UInt(v) => Value::String(v.to_string()),
        My::Float(v) => Value::String(v.to_string()),
        My::Double(v) => Value::String(v.to_string()),
        My::Date(y, mo, d, h, mi, s, us) => Value::String(if us > 0 {
            format!("{y:04}-{mo:02}-{d:02} {h:02}:{mi:02}:{s:02}.{us:06}")
        } else {
            format!("{y:04}-{mo:02}-{d:02} {h:02}:{mi:02}:{s:02}")
        }),
        My::Time(negative, days, h, mi, s, us) => {
            let sign = if negative { "-" } else { "" };
            let hours = u64::from(days) * 24 + u64::from(h);
            Value::String(if us > 0 {
                format!("{sign}{hours:02}:{mi:02}:{s:02}.{us:06}")
            } else {
                format!("{sign}{hours:02}:{mi:02}:{s:02}")
            })
        }
    }
}

/// Driver value bound to one `?` placeholder.
fn param(value: &Value) -> mysql_async::Value {
    use mysql_async::Value as My;
    match value {
        Value::Null => My::NULL,
        Value::String(text) => My::Bytes(text.clone().into_bytes()),
        Value::Int(v) => My::Int(*v),
        Value::Float(v) => My::Double(*v),
        Value::Decimal(v) => My::Bytes(v.to_string().into_bytes()),
        Value::Boolean(v) => My::Int(i64::from(*v)),
        Value::Bytes(bytes) => My::Bytes(bytes.clone()),
    }
}

fn text_row(mut row: mysql_async::Row) -> Row {
    (0..row.len())
        .map(|idx| {
            row.take::<mysql_async::Value, usize>(idx)
                .map(text_value)
                .unwrap_or(Value::Null)
        })
        .collect()
}

#[async_trait]
impl SqlAdapter for MySqlAdapter {
    fn kind(&self) -> DatabaseKind {
        DatabaseKind::MySql
    }

    fn dialect(&self) -> &'static dyn Dialect {
        &dialect::MySql
    }

    async fn open_query(&mut self, sql: &str, fetch_size: usize) -> Result<(), DbError> {
        debug!(%sql, "Running query");
        let rows: Vec<mysql_async::Row> = self.conn()?.query(sql).await?;
        self.pending = rows.into_iter().map(text_row).collect();
        self.fetch_size = fetch_size.max(1);
        Ok(())
    }

    async fn fetch_rows(&mut self) -> Result<Vec<Row>, DbError> {
        let take = self.fetch_size.min(self.pending.len());
        Ok(self.pending.drain(..take).collect())
    }

    async fn insert_rows(&mut self, table: &TableRef, rows: &[Row]) -> Result<(), DbError> {
        let mut tx = self.conn()?.start_transaction(TxOpts::default()).await?;
        for chunk in insert_chunks(rows, table.columns.len()) {
            let sql = dialect::MySql.insert_statement(table, chunk.len(), &[])?;
            let params = chunk.iter().flatten().map(param).collect::<Vec<_>>();
            tx.exec_drop(sql, Params::Positional(params)).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn exec_in_transaction(&mut self, sql: &str) -> Result<(), DbError> {
        let mut tx = self.conn()?.start_transaction(TxOpts::default()).await?;
        tx.query_drop(sql).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), DbError> {
        self.pending.clear();
        if let Some(conn) = self.conn.take() {
            conn.disconnect().await?;
        }
        Ok(())
    }
}
