use crate::{
    adapter::{RowSink, Scoped, SinkFactory, SinkOutput},
    args::{AdapterRequest, uri_path},
    error::AdapterError,
    file::csv::{
        STDIO_URI,
        error::FileError,
        settings::{CsvSettings, Quoting},
    },
};
use async_trait::async_trait;
use model::{core::value::Value, records::row::Row};
use std::{borrow::Cow, fs::File, io};
use tracing::{debug, info};

type CsvWriter = csv::Writer<Box<dyn io::Write + Send>>;

/// Writes batches to a CSV file or stdout.
pub struct CsvSink {
    writer: CsvWriter,
    /// Set for `QUOTE_NONE`, where these bytes would change the row shape.
    unquotable: Option<Vec<u8>>,
    rows_written: u64,
}

impl CsvSink {
    /// Writes text in the configured encoding to `output`.
    pub fn from_writer(output: Box<dyn io::Write + Send>, settings: &CsvSettings) -> Self {
        let output = settings.codec.writer(output);
        CsvSink {
            writer: settings.writer_builder().from_writer(output),
            unquotable: (settings.quoting == Quoting::None).then(|| settings.unquotable_bytes()),
            rows_written: 0,
        }
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    pub fn flush(&mut self) -> Result<(), FileError> {
        self.writer.flush().map_err(FileError::from)
    }
}

fn field_bytes(value: &Value) -> Cow<'_, [u8]> {
    match value {
        Value::Null => Cow::Borrowed(&[]),
        Value::String(text) => Cow::Borrowed(text.as_bytes()),
        Value::Bytes(bytes) => Cow::Borrowed(bytes),
        other => Cow::Owned(other.to_text().unwrap_or_default().into_bytes()),
    }
}

fn check_unquoted(row: &Row, unquotable: &[u8]) -> Result<(), FileError> {
    for value in row {
        let bytes = field_bytes(value);
        if bytes.iter().any(|b| unquotable.contains(b)) {
            return Err(FileError::WriteError(format!(
                "field {:?} needs quoting but quoting is QUOTE_NONE",
                String::from_utf8_lossy(&bytes)
            )));
        }
    }
    Ok(())
}

#[async_trait]
impl RowSink for CsvSink {
    async fn write_batch(&mut self, batch: &[Row]) -> Result<(), AdapterError> {
        for row in batch {
            if let Some(unquotable) = &self.unquotable {
                check_unquoted(row, unquotable)?;
            }
            self.writer
                .write_record(row.iter().map(field_bytes))
                .map_err(FileError::from)?;
        }
        self.rows_written += batch.len() as u64;
        Ok(())
    }
}

/// Creates the output file on `enter`, flushes and closes it on `exit`.
pub struct CsvSinkScope {
    uri: String,
    settings: CsvSettings,
    sink: Option<CsvSink>,
}

impl CsvSinkScope {
    pub fn new(uri: impl Into<String>, settings: CsvSettings) -> Self {
        CsvSinkScope {
            uri: uri.into(),
            settings,
            sink: None,
        }
    }
}

#[async_trait]
impl Scoped for CsvSinkScope {
    type Resource = dyn RowSink;

    async fn enter(&mut self) -> Result<(), AdapterError> {
        let output: Box<dyn io::Write + Send> = if self.uri == STDIO_URI {
            Box::new(io::stdout())
        } else {
            let path = uri_path(&self.uri);
            Box::new(File::create(&path).map_err(|err| FileError::open(&path, err))?)
        };
        self.sink = Some(CsvSink::from_writer(output, &self.settings));
        Ok(())
    }

    fn resource(&mut self) -> Result<&mut Self::Resource, AdapterError> {
        match self.sink.as_mut() {
            Some(sink) => Ok(sink),
            None => Err(AdapterError::NotAcquired(self.uri.clone())),
        }
    }

    async fn exit(&mut self) -> Result<(), AdapterError> {
        if let Some(mut sink) = self.sink.take() {
            sink.flush()?;
            debug!(uri = %self.uri, rows = sink.rows_written(), "CSV output closed");
        }
        Ok(())
    }
}

/// `csv::writer`
pub struct CsvWriterFactory;

#[async_trait]
impl SinkFactory for CsvWriterFactory {
    async fn create(&self, request: &AdapterRequest) -> Result<SinkOutput, AdapterError> {
        info!(uri = %request.uri, "Output");
        let settings = CsvSettings::from_args(&request.factory_args())?;
        settings.log();
        Ok(SinkOutput::scoped(CsvSinkScope::new(&request.uri, settings)))
    }
}
