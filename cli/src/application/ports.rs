//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` and the options crate, never
//! from `crate::infra`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tfharness_options::Options;

/// Environment variable the SSH agent socket is exported through.
pub const SSH_AUTH_SOCK: &str = "SSH_AUTH_SOCK";

// ── Value Types ───────────────────────────────────────────────────────────────

/// A fully resolved process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Working directory. Empty means the current directory.
    pub dir: PathBuf,
    /// Added on top of the inherited environment.
    pub env: HashMap<String, String>,
    /// Do not capture stderr.
    pub no_stderr: bool,
    /// Longest captured line in bytes, `0` for no limit.
    pub max_line_size: usize,
}

impl CommandSpec {
    /// Builds the invocation of `args` described by `options`.
    ///
    /// An SSH agent on the options overrides `SSH_AUTH_SOCK` from `env_vars`.
    #[must_use]
    pub fn from_options(options: &Options, args: &[String]) -> Self {
        let mut env = options.env_vars.clone();
        if let Some(agent) = &options.ssh_agent {
            env.insert(
                SSH_AUTH_SOCK.to_string(),
                agent.socket_path().display().to_string(),
            );
        }
        Self {
            program: options.binary_name().to_string(),
            args: args.to_vec(),
            dir: options.dir.clone(),
            env,
            no_stderr: options.no_stderr,
            max_line_size: options.output_max_line_size,
        }
    }

    /// `program arg1 arg2 ...`, for logs and error messages.
    #[must_use]
    pub fn description(&self) -> String {
        let mut text = self.program.clone();
        for arg in &self.args {
            text.push(' ');
            text.push_str(arg);
        }
        text
    }

    #[must_use]
    pub fn working_dir(&self) -> Option<&Path> {
        (!self.dir.as_os_str().is_empty()).then_some(self.dir.as_path())
    }
}

/// What a finished process left behind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    /// `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// stdout followed by stderr, separated by a newline when both are set.
    #[must_use]
    pub fn combined(&self) -> String {
        match (self.stdout.is_empty(), self.stderr.is_empty()) {
            (_, true) => self.stdout.clone(),
            (true, false) => self.stderr.clone(),
            (false, false) => {
                let sep = if self.stdout.ends_with('\n') { "" } else { "\n" };
                format!("{}{sep}{}", self.stdout, self.stderr)
            }
        }
    }

    /// Short reason for a failed run, e.g. `exit status 1`.
    #[must_use]
    pub fn failure_reason(&self) -> String {
        match self.code {
            Some(code) => format!("exit status {code}"),
            None => "terminated by signal".to_string(),
        }
    }
}

// ── Command Port ──────────────────────────────────────────────────────────────

/// Runs external processes.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run `spec` to completion and capture its output.
    ///
    /// A non-zero exit is reported through [`CommandOutput::success`], not
    /// as an error. Errors mean the process could not be run or waited on.
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput>;
}

// ── Options Port ──────────────────────────────────────────────────────────────

/// Loads [`Options`] from somewhere outside the process.
pub trait OptionsStore {
    fn load(&self) -> Result<Options>;
}
