//! External process execution.
//!
//! Runs converter binaries as child processes with a wall-clock timeout and
//! captured output.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;

/// Longest stderr excerpt kept in an error.
const STDERR_EXCERPT: usize = 2000;

/// Errors from running an external command.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// The command could not be started because it does not exist.
    #[error("Command not found: {0}")]
    CommandNotFound(String),

    /// The process was killed after exceeding its timeout.
    #[error("Timed out after {0} seconds")]
    Timeout(u64),

    /// The process exited with a non-zero code.
    #[error("Exited with code {code}: {stderr}")]
    ProcessFailed {
        /// The exit code, `-1` when terminated by a signal.
        code: i32,
        /// Standard error output (truncated).
        stderr: String,
    },

    /// IO error while spawning or waiting.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Captured result of a successful run.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// Standard output.
    pub stdout: String,
    /// Standard error.
    pub stderr: String,
    /// Wall-clock duration.
    pub duration_ms: u64,
}

/// One command invocation.
#[derive(Debug, Clone)]
pub struct ExecutionParams {
    /// Executable name or path.
    pub command: String,
    /// Arguments, passed without a shell.
    pub args: Vec<String>,
    /// Working directory.
    pub working_dir: Option<PathBuf>,
    /// Extra environment variables.
    pub env_vars: HashMap<String, String>,
    /// Timeout in seconds.
    pub timeout_seconds: u64,
}

impl ExecutionParams {
    /// Parameters for `command args...` with the given timeout.
    pub fn new(command: impl Into<String>, args: Vec<String>, timeout_seconds: u64) -> Self {
        Self {
            command: command.into(),
            args,
            working_dir: None,
            env_vars: HashMap::new(),
            timeout_seconds,
        }
    }

    /// Run inside `dir`.
    pub fn in_dir(mut self, dir: &Path) -> Self {
        self.working_dir = Some(dir.to_path_buf());
        self
    }

    /// Set an environment variable for the child.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.insert(key.into(), value.into());
        self
    }
}

/// Runs external commands.
#[derive(Debug, Clone, Default)]
pub struct ProcessExecutor;

impl ProcessExecutor {
    /// Create an executor.
    pub fn new() -> Self {
        Self
    }

    /// Run a command to completion. The child is killed if the timeout fires.
    ///
    /// The process runs on its own task: dropping the returned future stops
    /// waiting for it but leaves the child running until it exits or times out.
    pub async fn execute(&self, params: &ExecutionParams) -> Result<ExecutionResult, ExecutorError> {
        let start = std::time::Instant::now();

        tracing::debug!(
            command = %params.command,
            args = ?params.args,
            timeout = params.timeout_seconds,
            "Executing external command"
        );

        let mut cmd = Command::new(&params.command);
        cmd.args(&params.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(ref dir) = params.working_dir {
            cmd.current_dir(dir);
        }

        for (key, value) in &params.env_vars {
            cmd.env(key, value);
        }

        let timeout = Duration::from_secs(params.timeout_seconds);
        let result = tokio::spawn(async move { tokio::time::timeout(timeout, cmd.output()).await })
            .await
            .map_err(|e| ExecutorError::Io(std::io::Error::other(format!("Process task failed: {e}"))))?;
        let duration_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(Ok(output)) => {
                let stdout = String::from_utf8_lossy(&output.stdout).to_string();
                let stderr = String::from_utf8_lossy(&output.stderr).to_string();

                if !output.status.success() {
                    let code = output.status.code().unwrap_or(-1);
                    tracing::warn!(
                        command = %params.command,
                        code,
                        stderr = %stderr.chars().take(500).collect::<String>(),
                        "External command failed"
                    );
                    return Err(ExecutorError::ProcessFailed {
                        code,
                        stderr: stderr.chars().take(STDERR_EXCERPT).collect(),
                    });
                }

                tracing::info!(
                    command = %params.command,
                    duration_ms,
                    "External command completed"
                );
                Ok(ExecutionResult {
                    stdout,
                    stderr,
                    duration_ms,
                })
            }
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ExecutorError::CommandNotFound(params.command.clone()))
            }
            Ok(Err(e)) => {
                tracing::error!(command = %params.command, error = %e, "Failed to run external command");
                Err(ExecutorError::Io(e))
            }
            Err(_) => {
                tracing::error!(
                    command = %params.command,
                    timeout = params.timeout_seconds,
                    "External command timed out"
                );
                Err(ExecutorError::Timeout(params.timeout_seconds))
            }
        }
    }

    /// Whether `command` resolves to an executable. Paths are checked
    /// directly; bare names are looked up with `which` (`where` on Windows).
    pub async fn check_command_available(&self, command: &str) -> bool {
        let path = Path::new(command);
        if path.components().count() > 1 {
            return tokio::fs::metadata(path)
                .await
                .map(|m| m.is_file())
                .unwrap_or(false);
        }

        let finder = if cfg!(target_os = "windows") {
            "where"
        } else {
            "which"
        };
        Command::new(finder)
            .arg(command)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|status| status.success())
            .unwrap_or(false)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str, timeout: u64) -> ExecutionParams {
        ExecutionParams::new("sh", vec!["-c".to_string(), script.to_string()], timeout)
    }

    #[tokio::test]
    async fn test_captures_stdout() {
        let result = ProcessExecutor::new()
            .execute(&sh("printf converted", 10))
            .await
            .unwrap();
        assert_eq!(result.stdout, "converted");
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_process_failed() {
        let err = ProcessExecutor::new()
            .execute(&sh("echo broken >&2; exit 3", 10))
            .await
            .unwrap_err();
        match err {
            ExecutorError::ProcessFailed { code, stderr } => {
                assert_eq!(code, 3);
                assert!(stderr.contains("broken"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_timeout_kills_process() {
        let err = ProcessExecutor::new()
            .execute(&sh("sleep 5", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutorError::Timeout(1)));
    }

    #[tokio::test]
    async fn test_missing_command() {
        let params = ExecutionParams::new("pdfdesk-no-such-binary", vec![], 5);
        let err = ProcessExecutor::new().execute(&params).await.unwrap_err();
        assert!(matches!(err, ExecutorError::CommandNotFound(_)));
        assert!(!ProcessExecutor::new().check_command_available("pdfdesk-no-such-binary").await);
    }

    #[tokio::test]
    async fn test_working_dir_and_env() {
        let dir = tempfile::tempdir().unwrap();
        let params = sh("printf \"$GREETING\" > out.txt", 10)
            .in_dir(dir.path())
            .env("GREETING", "hello");
        ProcessExecutor::new().execute(&params).await.unwrap();
        assert_eq!(std::fs::read_to_string(dir.path().join("out.txt")).unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_dropped_caller_leaves_process_running() {
        let dir = tempfile::tempdir().unwrap();
        let params = sh("sleep 1; touch done", 10).in_dir(dir.path());
        let caller = tokio::spawn(async move { ProcessExecutor::new().execute(&params).await });

        tokio::time::sleep(Duration::from_millis(300)).await;
        caller.abort();
        assert!(caller.await.unwrap_err().is_cancelled());

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(dir.path().join("done").exists());
    }
}
