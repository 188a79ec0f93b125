use crate::{
    adapter::{RowSink, Scoped, SinkFactory, SinkOutput},
    args::AdapterRequest,
    error::AdapterError,
    sql::{
        Driver,
        base::{adapter::SqlAdapter, table::TableRef},
        dialect::check_row_widths,
    },
};
use async_trait::async_trait;
use model::records::row::Row;
use tracing::{debug, info};

/// Writes each batch in its own transaction, as multi-row `INSERT`s with
/// bound values.
pub struct InsertSink {
    adapter: Box<dyn SqlAdapter>,
    table: TableRef,
    rows_written: u64,
}

impl InsertSink {
    pub fn new(adapter: Box<dyn SqlAdapter>, table: TableRef) -> Self {
        InsertSink {
            adapter,
            table,
            rows_written: 0,
        }
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }
}

#[async_trait]
impl RowSink for InsertSink {
    async fn write_batch(&mut self, batch: &[Row]) -> Result<(), AdapterError> {
        if batch.is_empty() {
            return Ok(());
        }
        check_row_widths(&self.table, batch)?;
        self.adapter.insert_rows(&self.table, batch).await?;
        self.rows_written += batch.len() as u64;
        Ok(())
    }
}

pub struct InsertScope {
    uri: String,
    driver: Driver,
    table: TableRef,
    sink: Option<InsertSink>,
}

#[async_trait]
impl Scoped for InsertScope {
    type Resource = dyn RowSink;

    async fn enter(&mut self) -> Result<(), AdapterError> {
        let adapter = self.driver.connect(&self.uri).await?;
        self.sink = Some(InsertSink::new(adapter, self.table.clone()));
        Ok(())
    }

    fn resource(&mut self) -> Result<&mut Self::Resource, AdapterError> {
        match self.sink.as_mut() {
            Some(sink) => Ok(sink),
            None => Err(AdapterError::NotAcquired(self.table.name.clone())),
        }
    }

    async fn exit(&mut self) -> Result<(), AdapterError> {
        if let Some(mut sink) = self.sink.take() {
            debug!(
                table = %self.table.name,
                rows = sink.rows_written(),
                "Closing insert connection"
            );
            sink.adapter.close().await?;
        }
        Ok(())
    }
}

/// `db::insert`
pub struct InsertFactory;

#[async_trait]
impl SinkFactory for InsertFactory {
    async fn create(&self, request: &AdapterRequest) -> Result<SinkOutput, AdapterError> {
        info!(uri = %request.uri, "Output");
        let args = request.factory_args();
        let table = TableRef::from_args(&args, "output")?;
        let driver = Driver::from_uri(&request.uri)?;
        info!(
            schema = ?table.schema,
            table = %table.name,
            columns = %table.columns.join(","),
            dialect = driver.dialect().name(),
            "Target table"
        );

        Ok(SinkOutput::scoped(InsertScope {
            uri: request.uri.clone(),
            driver,
            table,
            sink: None,
        }))
    }
}
