use crate::report::error_report;
use engine_core::error::RunFailure;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Run(#[from] RunFailure),

    #[error("Failed to write to stdout: {0}")]
    Output(#[from] std::io::Error),
}

impl CliError {
    /// The pipeline step that was running when the error occurred.
    pub fn step(&self) -> &str {
        match self {
            CliError::Run(failure) => &failure.step,
            CliError::Output(_) => "",
        }
    }

    /// The `# Error` block printed to stderr.
    pub fn report(&self) -> String {
        match self {
            CliError::Run(failure) => error_report(&failure.step, &failure.error),
            CliError::Output(_) => error_report("", self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::error::PipelineError;

    #[test]
    fn run_failures_report_their_step() {
        let err = CliError::from(RunFailure::new(
            "Get only columns",
            PipelineError::Configuration("bad".into()),
        ));
        assert_eq!(err.step(), "Get only columns");
        assert_eq!(
            err.report(),
            "# Error: Get only columns\n---\nConfiguration error: bad\n---\n"
        );
    }
}
