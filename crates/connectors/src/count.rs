use crate::{
    adapter::{CountFn, CountInfo, CounterFactory, CounterOutput},
    args::{AdapterRequest, CommandArgs, uri_path},
    error::AdapterError,
    file::csv::{STDIO_URI, error::FileError},
};
use async_trait::async_trait;
use std::{
    fs::File,
    io::{BufRead, BufReader, Read},
    time::Instant,
};
use tracing::debug;

/// Counts lines up to the window end, then discounts the window start.
pub fn count_lines(input: impl Read, cmd_args: &CommandArgs) -> Result<CountInfo, AdapterError> {
    let started = Instant::now();
    let mut count: u64 = 0;
    if cmd_args.end_row_index != Some(0) {
        for line in BufReader::new(input).split(b'\n') {
            line.map_err(FileError::from)?;
            count += 1;
            if cmd_args.end_row_index.is_some_and(|end| count >= end) {
                break;
            }
        }
    }
    let duration = started.elapsed().as_secs_f64();
    let rate = (duration > 0.0).then(|| count as f64 / duration);

    let start = cmd_args.start_row_index.unwrap_or(0);
    Ok(CountInfo {
        count: Some(count.saturating_sub(start)),
        duration: Some(duration),
        rate,
    })
}

/// `count::lines`
pub struct LineCounterFactory;

#[async_trait]
impl CounterFactory for LineCounterFactory {
    async fn create(&self, request: &AdapterRequest) -> Result<CounterOutput, AdapterError> {
        // stdin can only be read once
        if request.uri == STDIO_URI {
            return Ok(CounterOutput::Info(CountInfo::default()));
        }
        let path = uri_path(&request.uri);
        let cmd_args = request.cmd_args;
        let counted = path.clone();
        let info = tokio::task::spawn_blocking(move || {
            let file = File::open(&counted).map_err(|err| FileError::open(&counted, err))?;
            count_lines(file, &cmd_args)
        })
        .await
        .map_err(|err| AdapterError::Generic(format!("line counter task failed: {err}")))??;
        debug!(path = %path, count = ?info.count, "Counted lines");
        Ok(CounterOutput::Info(info))
    }
}

/// Counter that reports a configured number without doing any work.
pub struct FixedCount(pub u64);

#[async_trait]
impl CountFn for FixedCount {
    async fn count(&mut self, _request: &AdapterRequest) -> Result<CountInfo, AdapterError> {
        Ok(CountInfo::of(self.0))
    }
}

/// `count::fixed`, reads the `count` argument.
pub struct FixedCounterFactory;

#[async_trait]
impl CounterFactory for FixedCounterFactory {
    async fn create(&self, request: &AdapterRequest) -> Result<CounterOutput, AdapterError> {
        let args = request.factory_args();
        args.require("count", "count")?;
        let count = args.parse_value::<u64>("count")?.unwrap_or_default();
        Ok(CounterOutput::Deferred(Box::new(FixedCount(count))))
    }
}
