//! Retry driver: runs one terraform invocation and retries transient failures.
//!
//! Both pattern maps are compiled before the first attempt, so a malformed
//! pattern stops the run without invoking terraform. After that each attempt
//! is classified: success, escalated warning, retryable failure or fatal
//! failure. Only retryable failures loop, at most `max_retries` times.

use tfharness_options::{FailureClass, Options, PatternSet, classify};

use crate::application::ports::{CommandOutput, CommandRunner, CommandSpec};
use crate::domain::error::RunError;

/// A failed attempt, before classification.
struct AttemptFailure {
    output: String,
    cause: String,
    /// Explanation of the warnings-as-errors pattern that failed the attempt.
    warning: Option<String>,
}

impl AttemptFailure {
    fn from_output(out: &CommandOutput) -> Self {
        Self {
            output: out.combined(),
            cause: out.failure_reason(),
            warning: None,
        }
    }

    fn from_warning(output: String, explanation: &str) -> Self {
        Self {
            output,
            cause: format!("Warning(s) were found: {explanation}"),
            warning: Some(explanation.to_string()),
        }
    }

    fn from_runner(err: &anyhow::Error) -> Self {
        Self {
            output: String::new(),
            cause: format!("{err:#}"),
            warning: None,
        }
    }

    fn into_fatal(self, description: String) -> RunError {
        match self.warning {
            Some(explanation) => RunError::WarningsFound {
                explanation,
                output: self.output,
            },
            None => RunError::Fatal {
                description,
                cause: self.cause,
                output: self.output,
            },
        }
    }
}

/// Runs `args` as described by `options`, retrying failures whose output
/// matches `options.retryable_errors`.
///
/// Returns the combined output of the successful attempt.
pub async fn run_with_retry<R: CommandRunner>(
    runner: &R,
    options: &Options,
    args: &[String],
) -> Result<String, RunError> {
    let retryable = options.retryable_patterns()?;
    let warnings = options.warning_patterns()?;

    let spec = CommandSpec::from_options(options, args);
    let description = spec.description();
    let max_retries = options.max_retries;
    let mut last: Option<AttemptFailure> = None;

    for attempt in 0..=max_retries {
        log(options, &format!("Running command {description}"));
        tracing::debug!(attempt, max_retries, dir = %spec.dir.display(), "terraform attempt");

        let failure = match runner.run(&spec).await {
            Ok(out) if out.success => match check_warnings(&warnings, out.combined()) {
                Ok(output) => return Ok(output),
                Err(failure) => failure,
            },
            Ok(out) => AttemptFailure::from_output(&out),
            Err(err) => AttemptFailure::from_runner(&err),
        };

        match classify(&retryable, &failure.output, &failure.cause) {
            FailureClass::Fatal => return Err(failure.into_fatal(description)),
            FailureClass::Retryable { explanation } => {
                if attempt < max_retries {
                    log(
                        options,
                        &format!(
                            "'{description}' failed with the error '{}' but this error was \
                             expected and warrants a retry. Further details: {explanation}",
                            failure.cause
                        ),
                    );
                    log(
                        options,
                        &format!(
                            "{description} returned an error: {}. Sleeping for {} and will try \
                             again.",
                            failure.cause,
                            humantime::format_duration(options.time_between_retries)
                        ),
                    );
                    tokio::time::sleep(options.time_between_retries).await;
                } else {
                    tracing::debug!(%explanation, "retryable error on the final attempt");
                }
                last = Some(failure);
            }
        }
    }

    let (last_cause, output) = last.map(|f| (f.cause, f.output)).unwrap_or_default();
    tracing::warn!(%description, max_retries, "retries exhausted");
    Err(RunError::MaxRetriesExceeded {
        description,
        max_retries,
        last_cause,
        output,
    })
}

fn check_warnings(warnings: &PatternSet, output: String) -> Result<String, AttemptFailure> {
    match warnings.find(&output) {
        Some(explanation) => {
            let explanation = explanation.to_string();
            Err(AttemptFailure::from_warning(output, &explanation))
        }
        None => Ok(output),
    }
}

/// Sends `message` to the options' logger, or to `tracing` when none is set.
fn log(options: &Options, message: &str) {
    match &options.logger {
        Some(logger) => logger.log(message),
        None => tracing::info!(target: "tfharness", "{message}"),
    }
}
