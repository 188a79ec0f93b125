#![allow(dead_code)]

use async_trait::async_trait;
use connectors::{
    adapter::{
        FnSink, IterSource, RowTransform, SinkFactory, SinkOutput, SourceFactory, SourceOutput,
        SourceResource, TransformFactory, TransformOutput,
    },
    args::{AdapterRequest, CommandArgs},
    error::AdapterError,
};
use engine_core::{error::RunFailure, options::PipelineOptions};
use engine_runtime::{
    execution::{RunSummary, run},
    registry::AdapterRegistry,
};
use model::{
    core::value::Value,
    records::row::{Row, RowOutcome},
};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

pub const MEMORY_INPUT: &str = "test::memory";
pub const RANGED_INPUT: &str = "test::ranged_memory";
pub const COLLECT_OUTPUT: &str = "test::collect";
pub const SKIP_X: &str = "test::skip_x";
pub const STOP_AT_5: &str = "test::stop_at_5";

pub type Batches = Arc<Mutex<Vec<Vec<Row>>>>;

/// Yields a fixed list of rows and leaves range control to the engine.
pub struct MemorySource {
    rows: Vec<Row>,
}

#[async_trait]
impl SourceFactory for MemorySource {
    async fn create(&self, _request: &AdapterRequest) -> Result<SourceOutput, AdapterError> {
        Ok(SourceOutput::direct(IterSource::new(self.rows.clone())))
    }
}

/// Applies the row window itself, the way a table query pushes down
/// `OFFSET`/`LIMIT`, and says so in its descriptor.
pub struct RangedMemorySource {
    rows: Vec<Row>,
}

#[async_trait]
impl SourceFactory for RangedMemorySource {
    async fn create(&self, request: &AdapterRequest) -> Result<SourceOutput, AdapterError> {
        let cmd_args = &request.cmd_args;
        let skip = cmd_args.start_row_index.unwrap_or(0) as usize;
        let take = cmd_args
            .start_end_row_diff
            .map_or(usize::MAX, |diff| diff as usize);
        let rows = self
            .rows
            .iter()
            .skip(skip)
            .take(take)
            .cloned()
            .collect::<Vec<_>>();
        Ok(SourceOutput::Descriptor {
            resource: SourceResource::Direct(Box::new(IterSource::new(rows))),
            supports_native_range_filtering: true,
        })
    }
}

/// Records every batch it receives.
pub struct CollectSink {
    batches: Batches,
}

#[async_trait]
impl SinkFactory for CollectSink {
    async fn create(&self, _request: &AdapterRequest) -> Result<SinkOutput, AdapterError> {
        let batches = self.batches.clone();
        Ok(SinkOutput::direct(FnSink::new(move |batch: &[Row]| {
            batches
                .lock()
                .map_err(|_| AdapterError::Generic("batch log poisoned".into()))?
                .push(batch.to_vec());
            Ok(())
        })))
    }
}

/// Whole-row transform built from a closure.
pub struct RowFn<F>(pub F);

impl<F> TransformFactory for RowFn<F>
where
    F: Fn(Row) -> Result<RowOutcome, AdapterError> + Clone + Send + Sync + 'static,
{
    fn create(
        &self,
        _args: &str,
        _cmd_args: &CommandArgs,
    ) -> Result<TransformOutput, AdapterError> {
        let transform = self.0.clone();
        Ok(TransformOutput::Row(
            Box::new(move |row: Row| transform(row)) as Box<dyn RowTransform>
        ))
    }
}

fn skip_x(row: Row) -> Result<RowOutcome, AdapterError> {
    if row.first() == Some(&Value::from("x")) {
        Ok(RowOutcome::Skip)
    } else {
        Ok(RowOutcome::Value(row))
    }
}

fn stop_at_5(row: Row) -> Result<RowOutcome, AdapterError> {
    if row.first() == Some(&Value::from("5")) {
        Ok(RowOutcome::Stop)
    } else {
        Ok(RowOutcome::Value(row))
    }
}

/// Builtin adapters plus in-memory ones over `rows`. The returned handle
/// sees every batch written to `test::collect`.
pub fn test_registry(rows: Vec<Row>) -> (AdapterRegistry, Batches) {
    let batches = Batches::default();
    let mut registry = AdapterRegistry::builtin();
    registry
        .register_source(MEMORY_INPUT, MemorySource { rows: rows.clone() })
        .register_source(RANGED_INPUT, RangedMemorySource { rows })
        .register_sink(
            COLLECT_OUTPUT,
            CollectSink {
                batches: batches.clone(),
            },
        )
        .register_transform(SKIP_X, RowFn(skip_x))
        .register_transform(STOP_AT_5, RowFn(stop_at_5));
    (registry, batches)
}

/// Rows `["1"]`, `["2"]`, ... `[n]`, so a row shows its own ordinal.
pub fn numbered_rows(n: usize) -> Vec<Row> {
    (1..=n).map(|i| vec![Value::from(i.to_string())]).collect()
}

pub fn memory_options() -> PipelineOptions {
    PipelineOptions {
        input_factory: MEMORY_INPUT.into(),
        output_factory: COLLECT_OUTPUT.into(),
        ..Default::default()
    }
}

pub async fn run_pipeline(
    registry: &AdapterRegistry,
    options: &PipelineOptions,
) -> Result<RunSummary, RunFailure> {
    run(registry, options, CancellationToken::new()).await
}

pub fn batch_sizes(batches: &Batches) -> Vec<usize> {
    batches.lock().unwrap().iter().map(Vec::len).collect()
}

pub fn flattened(batches: &Batches) -> Vec<Row> {
    batches.lock().unwrap().iter().flatten().cloned().collect()
}
