//! ABOUTME: Runner for external media commands (ffmpeg, ffprobe)
//! ABOUTME: Captures binary stdout with a hard timeout and kill-on-drop

use std::{process::Stdio, time::Duration};

use bytes::Bytes;
use metrics::counter;
use tokio::process::Command;
use tracing::{debug, warn};
use vg_core::{Error, Result};

/// Command specification for media-tool execution
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub timeout: Duration,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: Duration::from_secs(60),
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Captured result of a completed command
#[derive(Debug)]
pub struct CommandOutput {
    pub success: bool,
    /// Raw stdout; frame reads return encoded image bytes here
    pub stdout: Bytes,
    pub stderr: String,
}

/// Run a command to completion, enforcing the configured timeout.
///
/// The child is killed if the surrounding future is dropped or the
/// timeout elapses.
pub async fn run(spec: CommandSpec) -> Result<CommandOutput> {
    debug!(program = %spec.program, args = ?spec.args, "Running external command");

    let child = Command::new(&spec.program)
        .args(&spec.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| Error::External(format!("Failed to spawn {}: {}", spec.program, e)))?;

    let output = match tokio::time::timeout(spec.timeout, child.wait_with_output()).await {
        Ok(result) => result
            .map_err(|e| Error::External(format!("{} failed: {}", spec.program, e)))?,
        Err(_) => {
            counter!("media_command_timeouts_total").increment(1);
            warn!(program = %spec.program, timeout = ?spec.timeout, "Command timed out");
            return Err(Error::External(format!(
                "{} timed out after {:?}",
                spec.program, spec.timeout
            )));
        }
    };

    counter!("media_commands_total").increment(1);

    Ok(CommandOutput {
        success: output.status.success(),
        stdout: Bytes::from(output.stdout),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_captures_stdout() {
        let output = run(CommandSpec::new("echo").args(["hello"])).await.unwrap();
        assert!(output.success);
        assert_eq!(output.stdout.as_ref(), b"hello\n");
    }

    #[tokio::test]
    async fn test_run_reports_failure_status() {
        let output = run(CommandSpec::new("false")).await.unwrap();
        assert!(!output.success);
    }

    #[tokio::test]
    async fn test_run_missing_program_errors() {
        let result = run(CommandSpec::new("definitely-not-a-real-binary")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_run_times_out() {
        let result = run(CommandSpec::new("sleep")
            .args(["5"])
            .timeout(Duration::from_millis(100)))
        .await;
        assert!(matches!(result, Err(Error::External(_))));
    }
}
