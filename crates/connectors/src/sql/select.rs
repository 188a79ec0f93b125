use crate::{
    adapter::{RowSource, Scoped, SourceFactory, SourceOutput, SourceResource},
    args::AdapterRequest,
    error::AdapterError,
    sql::{Driver, base::adapter::SqlAdapter, base::table::TableRef},
};
use async_trait::async_trait;
use model::records::row::Row;
use std::collections::VecDeque;
use tracing::{debug, info};

/// How many times the select statement is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repeat {
    Times(u64),
    Forever,
}

impl Repeat {
    pub fn parse(text: Option<&str>) -> Result<Self, AdapterError> {
        let Some(text) = text else {
            return Ok(Repeat::Times(1));
        };
        match text.trim().parse::<i64>() {
            Ok(-1) => Ok(Repeat::Forever),
            Ok(n) if n >= 0 => Ok(Repeat::Times(n as u64)),
            _ => Err(AdapterError::invalid(
                "repeat",
                format!("{text:?} is neither a non-negative integer nor -1"),
            )),
        }
    }

    fn allows(self, executions: u64) -> bool {
        match self {
            Repeat::Times(n) => executions < n,
            Repeat::Forever => true,
        }
    }
}

/// Streams the rows of one statement, re-running it per `Repeat`.
pub struct SelectSource {
    adapter: Box<dyn SqlAdapter>,
    statement: String,
    repeat: Repeat,
    fetch_size: usize,
    buffer: VecDeque<Row>,
    executions: u64,
    rows_in_execution: u64,
    query_open: bool,
}

impl SelectSource {
    pub fn new(
        adapter: Box<dyn SqlAdapter>,
        statement: impl Into<String>,
        repeat: Repeat,
        fetch_size: usize,
    ) -> Self {
        SelectSource {
            adapter,
            statement: statement.into(),
            repeat,
            fetch_size,
            buffer: VecDeque::new(),
            executions: 0,
            rows_in_execution: 0,
            query_open: false,
        }
    }

    pub fn executions(&self) -> u64 {
        self.executions
    }

    async fn close(&mut self) -> Result<(), AdapterError> {
        self.buffer.clear();
        self.query_open = false;
        self.adapter.close().await?;
        Ok(())
    }
}

#[async_trait]
impl RowSource for SelectSource {
    async fn next_row(&mut self) -> Result<Option<Row>, AdapterError> {
        loop {
            if let Some(row) = self.buffer.pop_front() {
                self.rows_in_execution += 1;
                return Ok(Some(row));
            }

            if self.query_open {
                let rows = self.adapter.fetch_rows().await?;
                if rows.is_empty() {
                    self.query_open = false;
                } else {
                    self.buffer.extend(rows);
                }
                continue;
            }

            // An endless repeat of an empty result would never yield.
            let empty_forever = self.repeat == Repeat::Forever
                && self.executions > 0
                && self.rows_in_execution == 0;
            if empty_forever || !self.repeat.allows(self.executions) {
                return Ok(None);
            }

            self.executions += 1;
            self.rows_in_execution = 0;
            debug!(execution = self.executions, "Executing select statement");
            self.adapter
                .open_query(&self.statement, self.fetch_size)
                .await?;
            self.query_open = true;
        }
    }
}

/// Connects on `enter` and closes the connection on `exit`.
pub struct SelectScope {
    uri: String,
    driver: Driver,
    statement: String,
    repeat: Repeat,
    fetch_size: usize,
    source: Option<SelectSource>,
}

#[async_trait]
impl Scoped for SelectScope {
    type Resource = dyn RowSource;

    async fn enter(&mut self) -> Result<(), AdapterError> {
        let adapter = self.driver.connect(&self.uri).await?;
        self.source = Some(SelectSource::new(
            adapter,
            self.statement.clone(),
            self.repeat,
            self.fetch_size,
        ));
        Ok(())
    }

    fn resource(&mut self) -> Result<&mut Self::Resource, AdapterError> {
        match self.source.as_mut() {
            Some(source) => Ok(source),
            None => Err(AdapterError::NotAcquired(self.statement.clone())),
        }
    }

    async fn exit(&mut self) -> Result<(), AdapterError> {
        if let Some(mut source) = self.source.take() {
            debug!(executions = source.executions(), "Closing select connection");
            source.close().await?;
        }
        Ok(())
    }
}

/// `db::select`
///
/// With a raw query the statement runs as given and the engine filters the
/// row window. In table mode the window is pushed down as `OFFSET`/`LIMIT`
/// and the source reports native range support.
pub struct SelectFactory;

#[async_trait]
impl SourceFactory for SelectFactory {
    async fn create(&self, request: &AdapterRequest) -> Result<SourceOutput, AdapterError> {
        info!(uri = %request.uri, "Input");
        let driver = Driver::from_uri(&request.uri)?;
        let args = request.factory_args();
        let repeat = Repeat::parse(args.get("repeat"))?;

        let (statement, native_range) = if !request.query.trim().is_empty() {
            (request.query.clone(), false)
        } else {
            let table = TableRef::from_args(&args, "input")?;
            info!(schema = ?table.schema, table = %table.name, "Source table");
            let cmd = &request.cmd_args;
            let statement = driver.dialect().select_statement(
                &table,
                cmd.start_row_index,
                cmd.start_end_row_diff,
            );
            (statement, true)
        };
        info!(%statement, ?repeat, "Statement");

        let scope = SelectScope {
            uri: request.uri.clone(),
            driver,
            statement,
            repeat,
            fetch_size: request.cmd_args.batch_size,
            source: None,
        };
        Ok(SourceOutput::Descriptor {
            resource: SourceResource::Scoped(Box::new(scope)),
            supports_native_range_filtering: native_range,
        })
    }
}
