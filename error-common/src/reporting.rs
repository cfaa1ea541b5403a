// Error reporting through tracing.
use crate::context::ErrorContext;
use crate::types::{Categorized, ErrorCategory};

/// Render an error and all of its sources as `outer: inner: root`.
pub fn error_chain(error: &dyn std::error::Error) -> String {
    let mut rendered = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}

/// Log a categorized error with its context.
///
/// Collaborator and internal failures are logged at `error`, reconstruction
/// anomalies at `warn`, and expected outcomes (validation, no match) at `debug`.
pub fn report_error<E: Categorized>(context: &ErrorContext, error: &E) {
    let chain = error_chain(error);
    let code = error.code();
    let category = error.category();
    let session_id = context.session_id.as_deref().unwrap_or("-");
    let step = context.step.as_deref().unwrap_or("-");
    let caller = context.caller_ref.as_deref().unwrap_or("-");

    match category {
        ErrorCategory::Collaborator | ErrorCategory::Internal => tracing::error!(
            operation = %context.operation,
            session_id,
            step,
            caller,
            code = %code,
            category = %category,
            "{}",
            chain
        ),
        ErrorCategory::Reconstruction => tracing::warn!(
            operation = %context.operation,
            session_id,
            step,
            caller,
            code = %code,
            category = %category,
            "{}",
            chain
        ),
        ErrorCategory::Validation | ErrorCategory::NoMatch => tracing::debug!(
            operation = %context.operation,
            session_id,
            step,
            code = %code,
            category = %category,
            "{}",
            chain
        ),
    }
}
