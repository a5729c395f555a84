//! Infrastructure implementation of the `CommandRunner` port.
//!
//! `TokioCommandRunner` is the production implementation that uses tokio
//! for async process execution with guaranteed timeout and kill on all platforms.

use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::application::ports::{CommandOutput, CommandRunner, CommandSpec};

/// Default timeout for a single terraform invocation. Applies to
/// long-running `apply` and `destroy` too, so it is generous.
pub const DEFAULT_CMD_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// Production `CommandRunner`: uses tokio for async process execution
/// with guaranteed timeout and kill on all platforms.
///
/// `tokio::time::timeout` around `.output().await` does not kill the child
/// when the timeout fires on every platform, so this uses `tokio::select!`
/// with an explicit `child.kill()`.
pub struct TokioCommandRunner {
    timeout: Duration,
}

impl TokioCommandRunner {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for TokioCommandRunner {
    fn default() -> Self {
        Self::new(DEFAULT_CMD_TIMEOUT)
    }
}

impl CommandRunner for TokioCommandRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        let program = &spec.program;
        let mut command = tokio::process::Command::new(program);
        command
            .args(&spec.args)
            .envs(&spec.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(if spec.no_stderr {
                Stdio::null()
            } else {
                Stdio::piped()
            })
            .kill_on_drop(true);
        if let Some(dir) = spec.working_dir() {
            command.current_dir(dir);
        }

        let mut child = command
            .spawn()
            .with_context(|| format!("failed to spawn {program}"))?;

        let mut stdout_handle = child.stdout.take();
        let mut stderr_handle = child.stderr.take();

        tokio::select! {
            result = async {
                let (status, stdout, stderr) = tokio::join!(
                    child.wait(),
                    read_all(stdout_handle.as_mut()),
                    read_all(stderr_handle.as_mut()),
                );
                let status = status.with_context(|| format!("waiting for {program}"))?;
                Ok(CommandOutput {
                    success: status.success(),
                    code: status.code(),
                    stdout: cap_line_length(&stdout, spec.max_line_size),
                    stderr: cap_line_length(&stderr, spec.max_line_size),
                })
            } => result,
            () = tokio::time::sleep(self.timeout) => {
                let _ = child.kill().await;
                anyhow::bail!("{program} timed out after {}s", self.timeout.as_secs())
            }
        }
    }
}

async fn read_all<R: AsyncRead + Unpin>(handle: Option<&mut R>) -> String {
    let mut buf = Vec::new();
    if let Some(h) = handle {
        let _ = h.read_to_end(&mut buf).await;
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Cuts every line of `text` down to `max` bytes, on a char boundary.
/// `0` leaves the text unchanged.
#[must_use]
pub fn cap_line_length(text: &str, max: usize) -> String {
    if max == 0 {
        return text.to_string();
    }
    text.split_inclusive('\n')
        .map(|line| {
            let (body, newline) = match line.strip_suffix('\n') {
                Some(body) => (body, "\n"),
                None => (line, ""),
            };
            if body.len() <= max {
                return line.to_string();
            }
            let mut end = max;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}{newline}", &body[..end])
        })
        .collect()
}
