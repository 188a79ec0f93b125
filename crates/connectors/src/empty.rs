use crate::{
    adapter::{RowSink, RowSource, SinkFactory, SinkOutput, SourceFactory, SourceOutput},
    args::AdapterRequest,
    error::AdapterError,
};
use async_trait::async_trait;
use model::{core::value::Value, records::row::Row};

/// Endless stream of single-field rows holding an empty string.
pub struct EmptySource;

#[async_trait]
impl RowSource for EmptySource {
    async fn next_row(&mut self) -> Result<Option<Row>, AdapterError> {
        Ok(Some(vec![Value::String(String::new())]))
    }
}

/// Accepts and discards every batch.
pub struct DiscardSink;

#[async_trait]
impl RowSink for DiscardSink {
    async fn write_batch(&mut self, _batch: &[Row]) -> Result<(), AdapterError> {
        Ok(())
    }
}

/// `empty::input`
pub struct EmptyInputFactory;

#[async_trait]
impl SourceFactory for EmptyInputFactory {
    async fn create(&self, _request: &AdapterRequest) -> Result<SourceOutput, AdapterError> {
        Ok(SourceOutput::direct(EmptySource))
    }
}

/// `empty::output`
pub struct EmptyOutputFactory;

#[async_trait]
impl SinkFactory for EmptyOutputFactory {
    async fn create(&self, _request: &AdapterRequest) -> Result<SinkOutput, AdapterError> {
        Ok(SinkOutput::direct(DiscardSink))
    }
}
