//! Live resources an [`Options`](crate::Options) refers to but never owns.
//!
//! Both traits require `Send + Sync` so clones handed to parallel test cases
//! can share one handle through an `Arc`.

use std::fmt;
use std::path::Path;

/// An in-process SSH agent whose socket is exported to the child process as
/// `SSH_AUTH_SOCK`.
pub trait SshAgent: fmt::Debug + Send + Sync {
    /// Path of the agent's listening UNIX socket.
    fn socket_path(&self) -> &Path;
}

/// Sink for the progress messages the retry driver emits.
pub trait Logger: fmt::Debug + Send + Sync {
    fn log(&self, message: &str);
}

/// Forwards every message to `tracing` at INFO level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, message: &str) {
        tracing::info!(target: "tfharness", "{message}");
    }
}

/// Drops every message.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardLogger;

impl Logger for DiscardLogger {
    fn log(&self, _message: &str) {}
}
