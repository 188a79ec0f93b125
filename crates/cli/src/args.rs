use clap::Args;
use engine_core::{
    error::RunFailure,
    options::{
        CountSpec, DEFAULT_CONVERT_FACTORY, DEFAULT_INPUT_FACTORY, DEFAULT_OUTPUT_FACTORY,
        PipelineOptions,
    },
};

#[derive(Args, Debug, Clone)]
pub struct PourArgs {
    #[arg(long = "input", default_value = "", help = "Input URI passed to the input factory")]
    pub input_uri: String,

    #[arg(long, default_value = "", help = "Input query passed to the input factory")]
    pub input_query: String,

    #[arg(long, default_value = "", help = "Input arguments passed to the input factory")]
    pub input_args: String,

    #[arg(long, default_value = DEFAULT_INPUT_FACTORY, help = "Input factory reference")]
    pub input_factory: String,

    #[arg(long = "output", default_value = "", help = "Output URI passed to the output factory")]
    pub output_uri: String,

    #[arg(long, default_value = "", help = "Output query passed to the output factory")]
    pub output_query: String,

    #[arg(long, default_value = "", help = "Output arguments passed to the output factory")]
    pub output_args: String,

    #[arg(long, default_value = DEFAULT_OUTPUT_FACTORY, help = "Output factory reference")]
    pub output_factory: String,

    #[arg(long, default_value = "", help = "Count arguments passed to the count factory")]
    pub count_args: String,

    #[arg(long, help = "Count factory reference, or a fixed total row count")]
    pub count_factory: Option<String>,

    #[arg(long, help = "Only these input columns are fed to output, one-based, e.g. 3,1")]
    pub only_columns: Option<String>,

    #[arg(long, default_value = "", help = "Convert arguments, e.g. s,i,f,d,utf-8")]
    pub convert_args: String,

    #[arg(long, default_value = DEFAULT_CONVERT_FACTORY, help = "Convert factory reference")]
    pub convert_factory: String,

    #[arg(
        long,
        value_parser = clap::value_parser!(u64),
        help = "Starting row index, zero-based, inclusive"
    )]
    pub start_row: Option<u64>,

    #[arg(
        long,
        value_parser = clap::value_parser!(u64),
        help = "Ending row index, zero-based, exclusive"
    )]
    pub end_row: Option<u64>,

    #[arg(long, value_parser = clap::value_parser!(u64), help = "Process at most this many rows")]
    pub limit_rows: Option<u64>,

    #[arg(
        long,
        default_value_t = 1000,
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Rows accumulated per batch handed to the output"
    )]
    pub batch_size: u64,
}

impl PourArgs {
    pub fn into_options(self) -> Result<PipelineOptions, RunFailure> {
        let count_factory = match self.count_factory.as_deref() {
            Some(text) => {
                CountSpec::parse(text).map_err(|err| RunFailure::new("Get count factory", err))?
            }
            None => None,
        };
        Ok(PipelineOptions {
            input_uri: self.input_uri,
            input_query: self.input_query,
            input_args: self.input_args,
            input_factory: self.input_factory,
            output_uri: self.output_uri,
            output_query: self.output_query,
            output_args: self.output_args,
            output_factory: self.output_factory,
            count_args: self.count_args,
            count_factory,
            only_columns: self.only_columns,
            convert_args: self.convert_args,
            convert_factory: self.convert_factory,
            start_row: self.start_row,
            end_row: self.end_row,
            limit_rows: self.limit_rows,
            batch_size: usize::try_from(self.batch_size).unwrap_or(usize::MAX),
        })
    }
}
