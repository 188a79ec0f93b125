use crate::{
    adapter::{RowSink, RowSource, SinkFactory, SinkOutput, SourceFactory, SourceOutput},
    args::AdapterRequest,
    error::AdapterError,
};
use async_trait::async_trait;
use model::{core::value::Value, records::row::Row};
use tokio::io::{
    self, AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter, Lines,
};

/// One single-field row per input line, without the line terminator.
pub struct LineSource<R> {
    lines: Lines<R>,
}

impl<R: AsyncBufRead + Unpin + Send> LineSource<R> {
    pub fn new(reader: R) -> Self {
        LineSource {
            lines: reader.lines(),
        }
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> RowSource for LineSource<R> {
    async fn next_row(&mut self) -> Result<Option<Row>, AdapterError> {
        let line = self.lines.next_line().await?;
        Ok(line.map(|line| vec![Value::String(line)]))
    }
}

/// Writes every row as a JSON array on its own line.
pub struct JsonLinesSink<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        JsonLinesSink { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> RowSink for JsonLinesSink<W> {
    async fn write_batch(&mut self, batch: &[Row]) -> Result<(), AdapterError> {
        for row in batch {
            let fields = row.iter().map(Value::to_json).collect::<Vec<_>>();
            let mut line = serde_json::to_string(&fields)?;
            line.push('\n');
            self.writer.write_all(line.as_bytes()).await?;
        }
        self.writer.flush().await?;
        Ok(())
    }
}

/// `stdio::stdin`
pub struct StdinFactory;

#[async_trait]
impl SourceFactory for StdinFactory {
    async fn create(&self, _request: &AdapterRequest) -> Result<SourceOutput, AdapterError> {
        Ok(SourceOutput::direct(LineSource::new(BufReader::new(io::stdin()))))
    }
}

/// `stdio::stdout`
pub struct StdoutFactory;

#[async_trait]
impl SinkFactory for StdoutFactory {
    async fn create(&self, _request: &AdapterRequest) -> Result<SinkOutput, AdapterError> {
        Ok(SinkOutput::direct(JsonLinesSink::new(BufWriter::new(io::stdout()))))
    }
}
