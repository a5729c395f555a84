//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra` or `crate::application`.

use thiserror::Error;
use tfharness_options::PatternError;

// ── Run errors ────────────────────────────────────────────────────────────────

/// Why a terraform invocation driven by the retry loop did not succeed.
#[derive(Debug, Error)]
pub enum RunError {
    /// A key in `retryable_errors` or `warnings_as_errors` is not a valid
    /// regex. Reported before terraform runs.
    #[error("invalid retry configuration: {0}")]
    InvalidPattern(#[from] PatternError),

    /// The failure matched no retryable pattern.
    #[error("'{description}' failed with a non-retryable error: {cause}")]
    Fatal {
        description: String,
        cause: String,
        output: String,
    },

    /// A warnings-as-errors pattern matched and no retryable pattern did.
    #[error("Warning(s) were found: {explanation}")]
    WarningsFound { explanation: String, output: String },

    /// Every attempt failed with a retryable error.
    #[error("'{description}' unsuccessful after {max_retries} retries: {last_cause}")]
    MaxRetriesExceeded {
        description: String,
        max_retries: u32,
        last_cause: String,
        output: String,
    },
}

impl RunError {
    /// Output captured from the last attempt, if terraform ran at all.
    #[must_use]
    pub fn output(&self) -> Option<&str> {
        match self {
            Self::InvalidPattern(_) => None,
            Self::Fatal { output, .. }
            | Self::WarningsFound { output, .. }
            | Self::MaxRetriesExceeded { output, .. } => Some(output),
        }
    }

    /// `true` for configuration mistakes, as opposed to terraform failures.
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Self::InvalidPattern(_))
    }
}

// ── Argument errors ───────────────────────────────────────────────────────────

/// Errors building an argument list.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArgsError {
    #[error("'{command}' needs a name. Pass one with --name.")]
    MissingName { command: &'static str },
}
