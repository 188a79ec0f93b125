use std::error::Error;

/// Renders a failure the way it is printed to stderr:
///
/// ```text
/// # Error: Get output context
/// ---
/// Adapter error: Connector error: ...
/// caused by: ...
/// ---
/// ```
///
/// A source whose message is already part of the previous line is left out.
pub fn error_report(step: &str, error: &(dyn Error + 'static)) -> String {
    let mut report = if step.is_empty() {
        "# Error\n---\n".to_string()
    } else {
        format!("# Error: {step}\n---\n")
    };

    let mut previous = error.to_string();
    report.push_str(&previous);
    report.push('\n');

    let mut source = error.source();
    while let Some(cause) = source {
        let message = cause.to_string();
        if !previous.contains(&message) {
            report.push_str("caused by: ");
            report.push_str(&message);
            report.push('\n');
        }
        previous = message;
        source = cause.source();
    }

    report.push_str("---\n");
    report
}
