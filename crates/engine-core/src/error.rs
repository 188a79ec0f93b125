use connectors::error::AdapterError;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Invalid options or an invalid combination of them.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An adapter rejected the arguments it was created with.
    #[error("Invalid adapter configuration: {0}")]
    AdapterConfiguration(#[source] AdapterError),

    /// A source, sink or counter failed while running.
    #[error(transparent)]
    Adapter(AdapterError),

    #[error("Column position {position} is out of range for a row of {len} field(s)")]
    Projection { position: usize, len: usize },

    /// A field converter or row transform failed.
    #[error("Transform error: {0}")]
    Transform(#[source] AdapterError),
}

impl PipelineError {
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            PipelineError::Configuration(_) | PipelineError::AdapterConfiguration(_)
        )
    }
}

impl From<AdapterError> for PipelineError {
    fn from(err: AdapterError) -> Self {
        if err.is_configuration() {
            PipelineError::AdapterConfiguration(err)
        } else {
            PipelineError::Adapter(err)
        }
    }
}

/// A failed run: the step that was executing and what went wrong.
#[derive(Debug)]
pub struct RunFailure {
    pub step: String,
    pub error: PipelineError,
}

impl RunFailure {
    pub fn new(step: impl Into<String>, error: PipelineError) -> Self {
        RunFailure {
            step: step.into(),
            error,
        }
    }
}

impl fmt::Display for RunFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.step.is_empty() {
            write!(f, "{}", self.error)
        } else {
            write!(f, "{}: {}", self.step, self.error)
        }
    }
}

impl std::error::Error for RunFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_errors_are_classified() {
        let err = PipelineError::from(AdapterError::invalid("quoting", "bad"));
        assert!(err.is_configuration());
        let err = PipelineError::from(AdapterError::Generic("boom".into()));
        assert!(!err.is_configuration());
        assert!(matches!(err, PipelineError::Adapter(_)));
    }

    #[test]
    fn failure_names_the_step() {
        let failure = RunFailure::new("Process data", PipelineError::Configuration("x".into()));
        assert_eq!(failure.to_string(), "Process data: Configuration error: x");
    }
}
