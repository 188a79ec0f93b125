use tracing::debug;

/// Tracks the logical step a run is in, so a failure can be reported with it.
#[derive(Debug, Clone, Default)]
pub struct StepContext {
    title: String,
}

impl StepContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(&mut self, title: impl Into<String>) {
        self.title = title.into();
        debug!(step = %self.title, "Step");
    }

    pub fn current(&self) -> &str {
        &self.title
    }
}
