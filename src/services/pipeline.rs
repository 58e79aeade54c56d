use std::fmt::Display;

/// How a failing step affects the surrounding pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepPolicy {
    /// The error aborts the pipeline.
    Fatal,
    /// The error is logged at warn level and the pipeline continues.
    BestEffort,
}

/// Applies `policy` to the result of the step called `step`.
///
/// Best-effort failures come back as `Ok(None)`.
pub fn settle<T, E: Display>(
    step: &str,
    policy: StepPolicy,
    result: Result<T, E>,
) -> Result<Option<T>, E> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) => match policy {
            StepPolicy::Fatal => {
                tracing::error!("{} failed: {}", step, e);
                Err(e)
            }
            StepPolicy::BestEffort => {
                tracing::warn!("{} failed, continuing: {}", step, e);
                Ok(None)
            }
        },
    }
}
