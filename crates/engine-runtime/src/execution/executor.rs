use crate::{
    execution::{count, summary::RunSummary},
    registry::AdapterRegistry,
};
use connectors::{
    adapter::{AcquiredSource, RowSink, RowSource, SinkScope},
    args::{AdapterRequest, CommandArgs},
    error::AdapterError,
};
use engine_core::{
    batch::BatchAccumulator,
    error::{PipelineError, RunFailure},
    metrics::Metrics,
    options::{CountSpec, PipelineOptions},
    progress::ProgressTracker,
    projector::ColumnProjector,
    range::{Admission, RangeWindow},
    step::StepContext,
    transformer::RowTransformer,
};
use model::records::row::RowOutcome;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub async fn run(
    registry: &AdapterRegistry,
    options: &PipelineOptions,
    cancel: CancellationToken,
) -> Result<RunSummary, RunFailure> {
    PipelineExecutor::new(registry, options, cancel)
        .execute()
        .await
}

/// Per-row machinery, resolved before the source is opened.
struct RowPlan {
    window: RangeWindow,
    cmd_args: CommandArgs,
    projector: Option<ColumnProjector>,
    transformer: RowTransformer,
}

/// Drives one run: resolves adapters, holds the source and sink scopes open
/// around the pull loop and reports progress after every flush.
pub struct PipelineExecutor<'a> {
    registry: &'a AdapterRegistry,
    options: &'a PipelineOptions,
    cancel: CancellationToken,
    step: StepContext,
    metrics: Metrics,
}

impl<'a> PipelineExecutor<'a> {
    pub fn new(
        registry: &'a AdapterRegistry,
        options: &'a PipelineOptions,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            registry,
            options,
            cancel,
            step: StepContext::new(),
            metrics: Metrics::new(),
        }
    }

    pub async fn execute(mut self) -> Result<RunSummary, RunFailure> {
        let plan = self.prepare()?;
        let options = self.options;

        self.step.enter("Get input factory");
        let factory = self
            .registry
            .source(&options.input_factory)
            .map_err(|e| self.fail(e))?;
        let request = AdapterRequest::new(
            &options.input_uri,
            &options.input_query,
            &options.input_args,
            plan.cmd_args,
        );

        self.step.enter("Get input object");
        let output = factory.create(&request).await.map_err(|e| self.fail(e))?;
        let mut source = output.classify();
        if source.native_range_filtering {
            info!("Range control is done by the input adapter");
        }

        self.step.enter("Get input context");
        source.scope.enter().await.map_err(|e| self.fail(e))?;
        let result = self.with_source(&mut source, plan, &request).await;
        let released = source.scope.exit().await;
        self.release(result, released, "input")
    }

    fn prepare(&mut self) -> Result<RowPlan, RunFailure> {
        let options = self.options;

        self.step.enter("Parse arguments");
        options.validate().map_err(|e| self.fail(e))?;

        self.step.enter("Get row range");
        let window = options.window().map_err(|e| self.fail(e))?;
        debug!(
            start_index = ?window.start_index,
            end_index = ?window.end_index,
            diff = ?window.diff,
            "Row range"
        );

        self.step.enter("Get command arguments to be passed to factory");
        let cmd_args = window.command_args(options.batch_size);

        self.step.enter("Get only columns");
        let projector = options.projector().map_err(|e| self.fail(e))?;

        self.step.enter("Get convert factory");
        let factory = self
            .registry
            .transform(&options.convert_factory)
            .map_err(|e| self.fail(e))?;

        self.step.enter("Get convert function");
        let transformer = factory
            .create(&options.convert_args, &cmd_args)
            .map(RowTransformer::from)
            .map_err(|e| self.fail(e))?;

        Ok(RowPlan {
            window,
            cmd_args,
            projector,
            transformer,
        })
    }

    async fn with_source(
        &mut self,
        source: &mut AcquiredSource,
        plan: RowPlan,
        input_request: &AdapterRequest,
    ) -> Result<RunSummary, RunFailure> {
        let total = self.expected_total(&plan.window, input_request).await?;
        let options = self.options;

        self.step.enter("Get output factory");
        let factory = self
            .registry
            .sink(&options.output_factory)
            .map_err(|e| self.fail(e))?;
        let request = AdapterRequest::new(
            &options.output_uri,
            &options.output_query,
            &options.output_args,
            plan.cmd_args,
        );

        self.step.enter("Get output object");
        let mut sink: SinkScope = factory
            .create(&request)
            .await
            .map_err(|e| self.fail(e))?
            .into_scope();

        self.step.enter("Get output context");
        sink.enter().await.map_err(|e| self.fail(e))?;
        let result = self.with_sink(source, &mut sink, plan, total).await;
        let released = sink.exit().await;
        self.release(result, released, "output")
    }

    async fn with_sink(
        &mut self,
        source: &mut AcquiredSource,
        sink: &mut SinkScope,
        plan: RowPlan,
        total: Option<u64>,
    ) -> Result<RunSummary, RunFailure> {
        self.step.enter("Process data");
        let engine_range = !source.native_range_filtering;
        let input = source.scope.resource().map_err(|e| self.fail(e))?;
        let output = sink.resource().map_err(|e| self.fail(e))?;
        self.process(input, output, plan, engine_range, total).await
    }

    async fn expected_total(
        &mut self,
        window: &RangeWindow,
        input_request: &AdapterRequest,
    ) -> Result<Option<u64>, RunFailure> {
        self.step.enter("Get count factory");
        let counted = match &self.options.count_factory {
            None => None,
            Some(CountSpec::Literal(count)) => Some(*count),
            Some(CountSpec::Factory(reference)) => {
                let factory = self.registry.counter(reference).map_err(|e| self.fail(e))?;
                let request = AdapterRequest {
                    args: self.options.count_args.clone(),
                    ..input_request.clone()
                };
                let info = count::resolve(factory.as_ref(), &request)
                    .await
                    .map_err(|e| self.fail(e))?;
                if let Some(message) = count::message(&info) {
                    info!(
                        count = ?info.count,
                        duration = ?info.duration,
                        rate = ?info.rate,
                        "{message}"
                    );
                }
                info.count
            }
        };

        self.step.enter("Limit total row count");
        let total = count::cap(counted, window);
        debug!(total = ?total, "Expected total row count");
        Ok(total)
    }

    async fn process(
        &mut self,
        source: &mut dyn RowSource,
        sink: &mut dyn RowSink,
        mut plan: RowPlan,
        engine_range: bool,
        total: Option<u64>,
    ) -> Result<RunSummary, RunFailure> {
        let cancel = self.cancel.clone();
        let mut batch = BatchAccumulator::new(plan.cmd_args.batch_size);
        let mut progress = ProgressTracker::start();
        let mut ordinal: u64 = 0;
        let mut row_count: u64 = 0;
        let mut interrupted = false;

        loop {
            let pulled = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                next = source.next_row() => Some(next),
            };
            let Some(next) = pulled else {
                warn!(ordinal, "Interrupted");
                interrupted = true;
                break;
            };
            let Some(row) = next.map_err(|e| self.fail(e))? else {
                break;
            };

            ordinal += 1;
            self.metrics.increment_pulled();

            if engine_range {
                match plan.window.admit(ordinal) {
                    Admission::Before => continue,
                    Admission::End => break,
                    Admission::Inside => {}
                }
            }

            let row = match &plan.projector {
                Some(projector) => projector.project(row).map_err(|e| self.fail(e))?,
                None => row,
            };

            let row = match plan.transformer.apply(row).map_err(|e| self.fail(e))? {
                RowOutcome::Value(row) => row,
                RowOutcome::Skip => {
                    self.metrics.increment_skipped();
                    continue;
                }
                RowOutcome::Stop => {
                    debug!(ordinal, "Transform stopped the stream");
                    break;
                }
            };

            row_count += 1;
            batch.push(row);
            if batch.should_flush() {
                self.flush(&mut batch, sink, &mut progress, row_count, total)
                    .await?;
            }
        }

        if !interrupted && !batch.is_empty() {
            self.flush(&mut batch, sink, &mut progress, row_count, total)
                .await?;
        }

        let summary = RunSummary {
            rows: row_count,
            batches: batch.batches_flushed(),
            elapsed: progress.elapsed(),
            total_rate: progress.total_rate(),
            interrupted,
            last_step: self.step.current().to_string(),
            metrics: self.metrics.snapshot(),
        };
        info!(
            rows = summary.rows,
            batches = summary.batches,
            elapsed_secs = summary.elapsed.as_secs_f64(),
            total_rate = ?summary.total_rate,
            "{summary}"
        );
        Ok(summary)
    }

    async fn flush(
        &self,
        batch: &mut BatchAccumulator,
        sink: &mut dyn RowSink,
        progress: &mut ProgressTracker,
        row_count: u64,
        total: Option<u64>,
    ) -> Result<(), RunFailure> {
        let sent = batch.flush(sink).await.map_err(|e| self.fail(e))?;
        self.metrics.record_batch(sent as u64);

        let report = progress.snapshot(row_count, total);
        info!(
            rows = report.row_count,
            round_rows = report.round_rows,
            round_rate = ?report.round_rate,
            total_rate = ?report.total_rate,
            elapsed_secs = report.elapsed_secs,
            eta_secs = ?report.eta_secs,
            "{report}"
        );
        Ok(())
    }

    /// Combines the outcome of a scope's body with the outcome of releasing
    /// it. A body failure wins over a release failure.
    fn release(
        &self,
        result: Result<RunSummary, RunFailure>,
        released: Result<(), AdapterError>,
        side: &str,
    ) -> Result<RunSummary, RunFailure> {
        match (result, released) {
            (Ok(summary), Ok(())) => Ok(summary),
            (Ok(_), Err(err)) => Err(self.fail(err)),
            (Err(failure), Ok(())) => Err(failure),
            (Err(failure), Err(err)) => {
                warn!(error = %err, "Failed to release {side} after an error");
                Err(failure)
            }
        }
    }

    fn fail(&self, error: impl Into<PipelineError>) -> RunFailure {
        RunFailure::new(self.step.current(), error.into())
    }
}
