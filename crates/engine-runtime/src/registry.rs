use connectors::{
    adapter::{CounterFactory, SinkFactory, SourceFactory, TransformFactory},
    convert::FieldConvertFactory,
    count::{FixedCounterFactory, LineCounterFactory},
    empty::{EmptyInputFactory, EmptyOutputFactory},
    file::csv::{sink::CsvWriterFactory, source::CsvReaderFactory},
    sql::{insert::InsertFactory, select::SelectFactory},
    stdio::{StdinFactory, StdoutFactory},
};
use engine_core::error::PipelineError;
use std::{collections::BTreeMap, fmt, sync::Arc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AdapterKind {
    Source,
    Sink,
    Counter,
    Transform,
}

impl fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AdapterKind::Source => "source",
            AdapterKind::Sink => "sink",
            AdapterKind::Counter => "counter",
            AdapterKind::Transform => "transform",
        };
        f.write_str(name)
    }
}

/// Maps adapter references such as `csv::reader` to their factories.
///
/// References are resolved once, before any row is read.
#[derive(Default, Clone)]
pub struct AdapterRegistry {
    sources: BTreeMap<String, Arc<dyn SourceFactory>>,
    sinks: BTreeMap<String, Arc<dyn SinkFactory>>,
    counters: BTreeMap<String, Arc<dyn CounterFactory>>,
    transforms: BTreeMap<String, Arc<dyn TransformFactory>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every adapter shipped in `connectors`.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry
            .register_source("empty::input", EmptyInputFactory)
            .register_source("stdio::stdin", StdinFactory)
            .register_source("csv::reader", CsvReaderFactory)
            .register_source("db::select", SelectFactory)
            .register_sink("empty::output", EmptyOutputFactory)
            .register_sink("stdio::stdout", StdoutFactory)
            .register_sink("csv::writer", CsvWriterFactory)
            .register_sink("db::insert", InsertFactory)
            .register_counter("count::lines", LineCounterFactory)
            .register_counter("count::fixed", FixedCounterFactory)
            .register_transform("convert::fields", FieldConvertFactory);
        registry
    }

    pub fn register_source(
        &mut self,
        reference: impl Into<String>,
        factory: impl SourceFactory + 'static,
    ) -> &mut Self {
        self.sources.insert(reference.into(), Arc::new(factory));
        self
    }

    pub fn register_sink(
        &mut self,
        reference: impl Into<String>,
        factory: impl SinkFactory + 'static,
    ) -> &mut Self {
        self.sinks.insert(reference.into(), Arc::new(factory));
        self
    }

    pub fn register_counter(
        &mut self,
        reference: impl Into<String>,
        factory: impl CounterFactory + 'static,
    ) -> &mut Self {
        self.counters.insert(reference.into(), Arc::new(factory));
        self
    }

    pub fn register_transform(
        &mut self,
        reference: impl Into<String>,
        factory: impl TransformFactory + 'static,
    ) -> &mut Self {
        self.transforms.insert(reference.into(), Arc::new(factory));
        self
    }

    pub fn source(&self, reference: &str) -> Result<Arc<dyn SourceFactory>, PipelineError> {
        lookup(&self.sources, AdapterKind::Source, reference)
    }

    pub fn sink(&self, reference: &str) -> Result<Arc<dyn SinkFactory>, PipelineError> {
        lookup(&self.sinks, AdapterKind::Sink, reference)
    }

    pub fn counter(&self, reference: &str) -> Result<Arc<dyn CounterFactory>, PipelineError> {
        lookup(&self.counters, AdapterKind::Counter, reference)
    }

    pub fn transform(&self, reference: &str) -> Result<Arc<dyn TransformFactory>, PipelineError> {
        lookup(&self.transforms, AdapterKind::Transform, reference)
    }

    /// All registered references, grouped by kind and sorted.
    pub fn references(&self) -> Vec<(AdapterKind, &str)> {
        let sources = self.sources.keys().map(|r| (AdapterKind::Source, r.as_str()));
        let sinks = self.sinks.keys().map(|r| (AdapterKind::Sink, r.as_str()));
        let counters = self.counters.keys().map(|r| (AdapterKind::Counter, r.as_str()));
        let transforms = self
            .transforms
            .keys()
            .map(|r| (AdapterKind::Transform, r.as_str()));
        sources.chain(sinks).chain(counters).chain(transforms).collect()
    }
}

fn lookup<T: ?Sized>(
    factories: &BTreeMap<String, Arc<T>>,
    kind: AdapterKind,
    reference: &str,
) -> Result<Arc<T>, PipelineError> {
    factories.get(reference.trim()).cloned().ok_or_else(|| {
        let known = factories.keys().cloned().collect::<Vec<_>>().join(", ");
        PipelineError::Configuration(format!(
            "unknown {kind} adapter {reference:?} (available: {known})"
        ))
    })
}
