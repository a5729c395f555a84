//! The per-test configuration bundle for terraform invocations.
//!
//! Pure data only: no I/O, no validation at construction. Malformed regex
//! keys in the pattern maps surface when the retry driver compiles them
//! (see [`crate::patterns`]).

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::handles::{Logger, SshAgent};

/// Binary used when [`Options::binary`] is empty.
pub const DEFAULT_BINARY: &str = "terraform";

// ── Options ──────────────────────────────────────────────────────────────────

/// Options for running terraform commands.
///
/// `Clone` gives every map and list its own storage, so a test case can vary
/// a shared baseline without touching it. `ssh_agent` and `logger` are the
/// exception: they hold live OS resources or a shared sink, and a clone
/// points at the same handle as its source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Name or path of the binary to run. Empty means [`DEFAULT_BINARY`].
    pub binary: String,
    /// Directory containing the terraform code.
    pub dir: PathBuf,

    /// Values passed with `-var`.
    ///
    /// terraform cannot take `null` for a variable on the command line: a
    /// top-level `Value::Null` reaches the variable as the string `"null"`.
    /// Nulls nested inside lists and objects are passed through as HCL
    /// `null` and behave as expected.
    pub vars: HashMap<String, Value>,
    /// Paths passed with `-var-file`.
    pub var_files: Vec<PathBuf>,
    /// `-var` and `-var-file` entries in caller-chosen order.
    pub mixed_vars: Vec<Var>,
    /// Resource addresses passed with `-target`.
    pub targets: Vec<String>,

    pub lock: bool,
    /// Passed as `-lock-timeout` when non-empty, e.g. `"60s"`.
    pub lock_timeout: String,

    /// Extra environment for the child process.
    pub env_vars: HashMap<String, String>,
    /// Values passed to `init` with `-backend-config`. A `Value::Null` entry
    /// renders as the bare `-backend-config=<key>`.
    pub backend_config: HashMap<String, Value>,

    /// Regex matched against the output of a failed run, mapped to the
    /// message shown when that transient error is retried.
    pub retryable_errors: HashMap<String, String>,
    /// Retries after the first attempt for errors matching `retryable_errors`.
    pub max_retries: u32,
    #[serde(with = "humantime_serde")]
    pub time_between_retries: Duration,

    /// Regex matched against `Warning:` lines of a successful run, mapped to
    /// the message shown when the warning is escalated to a failure.
    pub warnings_as_errors: HashMap<String, String>,

    /// `init -upgrade`.
    pub upgrade: bool,
    /// `init -reconfigure`.
    pub reconfigure: bool,
    /// `init -migrate-state -force-copy`.
    pub migrate_state: bool,
    pub no_color: bool,
    /// Leave stderr out of the captured output.
    pub no_stderr: bool,
    /// Longest line kept from stdout/stderr, in bytes. `0` keeps lines whole.
    pub output_max_line_size: usize,
    /// `-parallelism` for plan, apply and destroy. `0` leaves terraform's default.
    pub parallelism: u32,
    /// Plan file written by `plan` (`-out`) and read by `apply`.
    pub plan_file_path: Option<PathBuf>,
    /// `init -plugin-dir`.
    pub plugin_dir: Option<PathBuf>,
    /// Pass `-var` options after `-var-file` options.
    pub set_vars_after_var_files: bool,

    /// Exported to the child as `SSH_AUTH_SOCK`, overriding the local agent.
    #[serde(skip)]
    pub ssh_agent: Option<Arc<dyn SshAgent>>,
    /// Sink for driver messages. `None` logs through `tracing`.
    #[serde(skip)]
    pub logger: Option<Arc<dyn Logger>>,

    pub extra_args: ExtraArgs,
}

impl Options {
    /// Options for the terraform code in `dir`, everything else defaulted.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ..Self::default()
        }
    }

    /// The binary to run, falling back to [`DEFAULT_BINARY`].
    #[must_use]
    pub fn binary_name(&self) -> &str {
        if self.binary.is_empty() {
            DEFAULT_BINARY
        } else {
            &self.binary
        }
    }

    /// A copy of these options with the built-in retryable errors merged in.
    ///
    /// See [`crate::with_default_retryable_errors`].
    #[must_use]
    pub fn with_default_retryable_errors(&self) -> Self {
        crate::defaults::with_default_retryable_errors(self)
    }
}

// ── Extra arguments ──────────────────────────────────────────────────────────

/// Extra arguments appended to each terraform subcommand.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtraArgs {
    pub apply: Vec<String>,
    pub destroy: Vec<String>,
    pub get: Vec<String>,
    pub init: Vec<String>,
    pub plan: Vec<String>,
    pub validate: Vec<String>,
    pub validate_inputs: Vec<String>,
    pub workspace_delete: Vec<String>,
    pub workspace_select: Vec<String>,
    pub workspace_new: Vec<String>,
    pub output: Vec<String>,
    pub show: Vec<String>,
}

// ── Mixed vars ───────────────────────────────────────────────────────────────

/// One entry of [`Options::mixed_vars`].
///
/// In an options file a var file is a bare path and an inline var is a
/// `{ name, value }` mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Var {
    /// Rendered as `-var <name>=<value>`.
    Inline { name: String, value: Value },
    /// Rendered as `-var-file <path>`.
    File(PathBuf),
}

impl Var {
    #[must_use]
    pub fn inline(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Inline {
            name: name.into(),
            value: value.into(),
        }
    }

    #[must_use]
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
