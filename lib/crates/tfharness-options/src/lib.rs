//! Invocation options and transient-failure policy for running terraform
//! from automated tests.
//!
//! [`Options`] is the per-test configuration bundle. Cloning it gives a test
//! case its own copy of every map and list while the live SSH-agent and
//! logger handles stay shared. [`with_default_retryable_errors`] layers the
//! built-in table of known-transient failures on top of a copy.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod defaults;
pub mod handles;
pub mod options;
pub mod patterns;

pub use defaults::{
    DEFAULT_MAX_RETRIES, DEFAULT_RETRYABLE_ERRORS, DEFAULT_TIME_BETWEEN_RETRIES,
    default_retryable_errors, with_default_retryable_errors,
};
pub use handles::{DiscardLogger, Logger, SshAgent, TracingLogger};
pub use options::{DEFAULT_BINARY, ExtraArgs, Options, Var};
pub use patterns::{FailureClass, PatternError, PatternSet, WarningMatch, classify};
