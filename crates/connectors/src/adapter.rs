use crate::{
    args::{AdapterRequest, CommandArgs},
    error::AdapterError,
};
use async_trait::async_trait;
use model::{
    core::value::Value,
    records::row::{Row, RowOutcome},
};
use std::sync::Arc;

/// A pull-based stream of rows.
#[async_trait]
pub trait RowSource: Send {
    /// Returns the next row, or `None` once the stream is exhausted.
    async fn next_row(&mut self) -> Result<Option<Row>, AdapterError>;
}

/// Receives rows one batch per call.
#[async_trait]
pub trait RowSink: Send {
    async fn write_batch(&mut self, batch: &[Row]) -> Result<(), AdapterError>;
}

/// A resource whose acquisition and release bracket a unit of work.
///
/// Once `enter` succeeds, `exit` is called on every path, whether the work
/// completed, stopped early or failed. A failed `enter` acquired nothing, so
/// `exit` is not called and `enter` must clean up after itself.
#[async_trait]
pub trait Scoped: Send {
    type Resource: ?Sized + Send;

    async fn enter(&mut self) -> Result<(), AdapterError>;

    /// The acquired resource. Fails with `NotAcquired` before `enter`.
    fn resource(&mut self) -> Result<&mut Self::Resource, AdapterError>;

    async fn exit(&mut self) -> Result<(), AdapterError>;
}

pub type SourceScope = Box<dyn Scoped<Resource = dyn RowSource>>;
pub type SinkScope = Box<dyn Scoped<Resource = dyn RowSink>>;

/// Wraps a resource with no acquisition step so it can be driven as `Scoped`.
pub struct Unscoped<R: ?Sized>(Box<R>);

impl<R: ?Sized> Unscoped<R> {
    pub fn new(inner: Box<R>) -> Self {
        Unscoped(inner)
    }
}

#[async_trait]
impl<R: ?Sized + Send> Scoped for Unscoped<R> {
    type Resource = R;

    async fn enter(&mut self) -> Result<(), AdapterError> {
        Ok(())
    }

    fn resource(&mut self) -> Result<&mut R, AdapterError> {
        Ok(&mut *self.0)
    }

    async fn exit(&mut self) -> Result<(), AdapterError> {
        Ok(())
    }
}

/// The resource part of a source descriptor.
pub enum SourceResource {
    Direct(Box<dyn RowSource>),
    Scoped(SourceScope),
}

impl SourceResource {
    fn into_scope(self) -> SourceScope {
        match self {
            SourceResource::Direct(source) => Box::new(Unscoped::new(source)),
            SourceResource::Scoped(scope) => scope,
        }
    }
}

/// What a source factory hands back.
pub enum SourceOutput {
    Direct(Box<dyn RowSource>),
    Scoped(SourceScope),
    /// A resource together with its declared capabilities.
    Descriptor {
        resource: SourceResource,
        supports_native_range_filtering: bool,
    },
}

/// A source output after classification: always scoped, capabilities explicit.
pub struct AcquiredSource {
    pub scope: SourceScope,
    pub native_range_filtering: bool,
}

impl SourceOutput {
    pub fn direct(source: impl RowSource + 'static) -> Self {
        SourceOutput::Direct(Box::new(source))
    }

    pub fn scoped(scope: impl Scoped<Resource = dyn RowSource> + 'static) -> Self {
        SourceOutput::Scoped(Box::new(scope))
    }

    pub fn classify(self) -> AcquiredSource {
        match self {
            SourceOutput::Direct(source) => AcquiredSource {
                scope: Box::new(Unscoped::new(source)),
                native_range_filtering: false,
            },
            SourceOutput::Scoped(scope) => AcquiredSource {
                scope,
                native_range_filtering: false,
            },
            SourceOutput::Descriptor {
                resource,
                supports_native_range_filtering,
            } => AcquiredSource {
                scope: resource.into_scope(),
                native_range_filtering: supports_native_range_filtering,
            },
        }
    }
}

/// What a sink factory hands back.
pub enum SinkOutput {
    Direct(Box<dyn RowSink>),
    Scoped(SinkScope),
}

impl SinkOutput {
    pub fn direct(sink: impl RowSink + 'static) -> Self {
        SinkOutput::Direct(Box::new(sink))
    }

    pub fn scoped(scope: impl Scoped<Resource = dyn RowSink> + 'static) -> Self {
        SinkOutput::Scoped(Box::new(scope))
    }

    pub fn into_scope(self) -> SinkScope {
        match self {
            SinkOutput::Direct(sink) => Box::new(Unscoped::new(sink)),
            SinkOutput::Scoped(scope) => scope,
        }
    }
}

/// Expected total row count, with the time and rate spent computing it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CountInfo {
    pub count: Option<u64>,
    pub duration: Option<f64>,
    pub rate: Option<f64>,
}

impl CountInfo {
    pub fn of(count: u64) -> Self {
        CountInfo {
            count: Some(count),
            ..Default::default()
        }
    }
}

/// A counter whose work is deferred until the orchestrator asks for it.
#[async_trait]
pub trait CountFn: Send {
    async fn count(&mut self, request: &AdapterRequest) -> Result<CountInfo, AdapterError>;
}

pub enum CounterOutput {
    Info(CountInfo),
    Deferred(Box<dyn CountFn>),
}

pub type FieldConverter = Arc<dyn Fn(Value) -> Result<Value, AdapterError> + Send + Sync>;

/// A whole-row transform.
pub trait RowTransform: Send {
    fn apply(&mut self, row: Row) -> Result<RowOutcome, AdapterError>;
}

impl<F> RowTransform for F
where
    F: FnMut(Row) -> Result<RowOutcome, AdapterError> + Send,
{
    fn apply(&mut self, row: Row) -> Result<RowOutcome, AdapterError> {
        self(row)
    }
}

/// What a transform factory hands back.
pub enum TransformOutput {
    Identity,
    /// One optional converter per field position; `None` leaves the field as is.
    Fields(Vec<Option<FieldConverter>>),
    Row(Box<dyn RowTransform>),
}

#[async_trait]
pub trait SourceFactory: Send + Sync {
    async fn create(&self, request: &AdapterRequest) -> Result<SourceOutput, AdapterError>;
}

#[async_trait]
pub trait SinkFactory: Send + Sync {
    async fn create(&self, request: &AdapterRequest) -> Result<SinkOutput, AdapterError>;
}

#[async_trait]
pub trait CounterFactory: Send + Sync {
    async fn create(&self, request: &AdapterRequest) -> Result<CounterOutput, AdapterError>;
}

pub trait TransformFactory: Send + Sync {
    fn create(&self, args: &str, cmd_args: &CommandArgs) -> Result<TransformOutput, AdapterError>;
}

/// Source over an in-memory iterator.
pub struct IterSource<I> {
    rows: I,
}

impl<I> IterSource<I>
where
    I: Iterator<Item = Row> + Send,
{
    pub fn new(rows: impl IntoIterator<IntoIter = I>) -> Self {
        IterSource {
            rows: rows.into_iter(),
        }
    }
}

#[async_trait]
impl<I> RowSource for IterSource<I>
where
    I: Iterator<Item = Row> + Send,
{
    async fn next_row(&mut self) -> Result<Option<Row>, AdapterError> {
        Ok(self.rows.next())
    }
}

/// Sink backed by a closure.
pub struct FnSink<F>(F);

impl<F> FnSink<F>
where
    F: FnMut(&[Row]) -> Result<(), AdapterError> + Send,
{
    pub fn new(write: F) -> Self {
        FnSink(write)
    }
}

#[async_trait]
impl<F> RowSink for FnSink<F>
where
    F: FnMut(&[Row]) -> Result<(), AdapterError> + Send,
{
    async fn write_batch(&mut self, batch: &[Row]) -> Result<(), AdapterError> {
        (self.0)(batch)
    }
}
