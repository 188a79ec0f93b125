use connectors::{adapter::RowSink, error::AdapterError};
use model::records::{batch::Batch, row::Row};

/// Buffers rows and hands them to a sink `batch_size` at a time.
#[derive(Debug)]
pub struct BatchAccumulator {
    batch_size: usize,
    rows: Batch,
    batches_flushed: u64,
}

impl BatchAccumulator {
    pub fn new(batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        BatchAccumulator {
            batch_size,
            rows: Vec::with_capacity(batch_size.min(8192)),
            batches_flushed: 0,
        }
    }

    pub fn push(&mut self, row: Row) {
        self.rows.push(row);
    }

    pub fn should_flush(&self) -> bool {
        self.rows.len() >= self.batch_size
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn batches_flushed(&self) -> u64 {
        self.batches_flushed
    }

    /// Sends the buffered rows as one call and clears the buffer.
    /// Returns the number of rows sent; an empty buffer is not sent.
    pub async fn flush(&mut self, sink: &mut dyn RowSink) -> Result<usize, AdapterError> {
        if self.rows.is_empty() {
            return Ok(0);
        }
        sink.write_batch(&self.rows).await?;
        let sent = self.rows.len();
        self.rows.clear();
        self.batches_flushed += 1;
        Ok(sent)
    }
}
