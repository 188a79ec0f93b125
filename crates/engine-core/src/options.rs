use crate::{error::PipelineError, projector::ColumnProjector, range::RangeWindow};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_INPUT_FACTORY: &str = "empty::input";
pub const DEFAULT_OUTPUT_FACTORY: &str = "empty::output";
pub const DEFAULT_CONVERT_FACTORY: &str = "convert::fields";
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Where the expected total row count comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountSpec {
    /// A number given directly, used without any counting.
    Literal(u64),
    /// Reference of a counter adapter.
    Factory(String),
}

impl CountSpec {
    /// All-digit text is a literal count, anything else names a counter.
    pub fn parse(text: &str) -> Result<Option<Self>, PipelineError> {
        let text = text.trim();
        if text.is_empty() {
            Ok(None)
        } else if text.bytes().all(|b| b.is_ascii_digit()) {
            let count = text.parse().map_err(|_| {
                PipelineError::Configuration(format!("count {text:?} does not fit in 64 bits"))
            })?;
            Ok(Some(CountSpec::Literal(count)))
        } else {
            Ok(Some(CountSpec::Factory(text.to_string())))
        }
    }
}

impl fmt::Display for CountSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CountSpec::Literal(count) => write!(f, "{count}"),
            CountSpec::Factory(reference) => f.write_str(reference),
        }
    }
}

/// Everything a run needs, as parsed from the command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    pub input_uri: String,
    pub input_query: String,
    pub input_args: String,
    pub input_factory: String,

    pub output_uri: String,
    pub output_query: String,
    pub output_args: String,
    pub output_factory: String,

    pub count_args: String,
    pub count_factory: Option<CountSpec>,

    /// One-based, comma separated column positions.
    pub only_columns: Option<String>,
    pub convert_args: String,
    pub convert_factory: String,

    pub start_row: Option<u64>,
    pub end_row: Option<u64>,
    pub limit_rows: Option<u64>,
    pub batch_size: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        PipelineOptions {
            input_uri: String::new(),
            input_query: String::new(),
            input_args: String::new(),
            input_factory: DEFAULT_INPUT_FACTORY.to_string(),
            output_uri: String::new(),
            output_query: String::new(),
            output_args: String::new(),
            output_factory: DEFAULT_OUTPUT_FACTORY.to_string(),
            count_args: String::new(),
            count_factory: None,
            only_columns: None,
            convert_args: String::new(),
            convert_factory: DEFAULT_CONVERT_FACTORY.to_string(),
            start_row: None,
            end_row: None,
            limit_rows: None,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl PipelineOptions {
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.batch_size == 0 {
            return Err(PipelineError::Configuration(
                "batch size must be greater than 0".to_string(),
            ));
        }
        for (name, reference) in [
            ("input factory", &self.input_factory),
            ("output factory", &self.output_factory),
            ("convert factory", &self.convert_factory),
        ] {
            if reference.trim().is_empty() {
                return Err(PipelineError::Configuration(format!("{name} is empty")));
            }
        }
        self.projector()?;
        self.window()?;
        Ok(())
    }

    pub fn window(&self) -> Result<RangeWindow, PipelineError> {
        RangeWindow::resolve(self.start_row, self.end_row, self.limit_rows)
    }

    /// `None` when every column is kept.
    pub fn projector(&self) -> Result<Option<ColumnProjector>, PipelineError> {
        match self.only_columns.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(text) => ColumnProjector::parse(text).map(Some),
        }
    }
}
