//! Builder for executing external tool commands.
//!
//! Two execution modes are offered:
//!
//! - [`ToolCommand::execute`] captures stdout/stderr and fails on any
//!   non-zero exit. Used for short-lived tools such as ffprobe.
//! - [`ToolCommand::run_supervised`] is for long-running encoders. The child
//!   is killed when the cancellation token fires, when the timeout elapses,
//!   or when the returned future is dropped. ffmpeg `-progress` blocks on
//!   stdout are parsed and forwarded as [`ProgressTick`]s.
//! - [`ToolCommand::spawn_output`] hands the child's stdout to the caller as
//!   an [`AsyncRead`]. Dropping the reader kills the child.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::pin::Pin;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, ReadBuf};
use tokio::process::{ChildStdout, Command};
use tokio_util::sync::{CancellationToken, DropGuard};

use tc_core::Error;

/// Default command timeout: 5 minutes.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Number of stderr lines kept for error messages.
const STDERR_TAIL_LINES: usize = 20;

/// Output captured from a tool execution.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Process exit status.
    pub status: ExitStatus,
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
}

/// Result of a supervised run that reached process exit.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub status: ExitStatus,
    /// Last lines written to stderr.
    pub stderr_tail: String,
}

/// One ffmpeg `-progress` block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressTick {
    /// Output timestamp reached so far.
    pub out_time_ms: u64,
    /// `progress=end` was reported.
    pub done: bool,
}

/// Callback receiving progress ticks.
pub type ProgressFn = Arc<dyn Fn(ProgressTick) + Send + Sync>;

/// Incremental parser for ffmpeg `-progress` output.
#[derive(Debug, Default)]
pub struct ProgressParser {
    out_time_us: u64,
}

impl ProgressParser {
    /// Feed one line; returns a tick when a block is terminated.
    pub fn feed(&mut self, line: &str) -> Option<ProgressTick> {
        let (key, value) = line.trim().split_once('=')?;
        match key {
            // ffmpeg reports microseconds under both names.
            "out_time_us" | "out_time_ms" => {
                if let Ok(us) = value.trim().parse::<u64>() {
                    self.out_time_us = us;
                }
                None
            }
            "progress" => Some(ProgressTick {
                out_time_ms: self.out_time_us / 1000,
                done: value.trim() == "end",
            }),
            _ => None,
        }
    }
}

/// A builder for constructing and executing external tool invocations.
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl ToolCommand {
    /// Create a new command for the given program path.
    pub fn new(program: PathBuf) -> Self {
        Self {
            program,
            args: Vec::new(),
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }

    /// Append a single argument.
    pub fn arg(&mut self, s: impl Into<String>) -> &mut Self {
        self.args.push(s.into());
        self
    }

    /// Append multiple arguments.
    pub fn args(&mut self, iter: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.args.extend(iter.into_iter().map(Into::into));
        self
    }

    /// Set the maximum execution time. `None` disables the limit.
    pub fn timeout(&mut self, d: Option<Duration>) -> &mut Self {
        self.timeout = d;
        self
    }

    /// Arguments collected so far.
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Short tool name used in errors and logs.
    pub fn tool_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }

    /// Execute the command, capturing stdout and stderr.
    ///
    /// # Errors
    ///
    /// [`Error::Tool`] if spawning fails, the process times out, or it exits
    /// with a non-zero status (message includes stderr).
    pub async fn execute(&self) -> tc_core::Result<ToolOutput> {
        let program_name = self.tool_name();

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd
            .spawn()
            .map_err(|e| Error::tool(&program_name, format!("failed to spawn: {e}")))?;

        let output = tokio::select! {
            res = child.wait_with_output() => res
                .map_err(|e| Error::tool(&program_name, format!("I/O error waiting for process: {e}")))?,
            _ = sleep_opt(self.timeout) => {
                return Err(Error::tool(
                    &program_name,
                    format!("timed out after {:?}", self.timeout.unwrap_or_default()),
                ));
            }
        };

        let tool_output = ToolOutput {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };

        if !output.status.success() {
            return Err(Error::tool(
                program_name,
                format!(
                    "exited with status {}: {}",
                    output.status,
                    tool_output.stderr.trim()
                ),
            ));
        }

        Ok(tool_output)
    }

    /// Run a long-lived process under supervision.
    ///
    /// Returns the exit status once the process ends on its own; the caller
    /// decides which statuses count as success (see [`check_exit`]).
    ///
    /// # Errors
    ///
    /// - [`Error::Cancelled`] if `cancel` fires first (the child is killed).
    /// - [`Error::Tool`] on spawn failure or timeout.
    pub async fn run_supervised(
        &self,
        cancel: &CancellationToken,
        progress: Option<ProgressFn>,
    ) -> tc_core::Result<RunOutcome> {
        let program_name = self.tool_name();

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .map_err(|e| Error::tool(&program_name, format!("failed to spawn: {e}")))?;

        tracing::debug!(tool = %program_name, pid = ?child.id(), "Spawned supervised process");

        let stdout_task = child.stdout.take().map(|stdout| {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stdout).lines();
                let mut parser = ProgressParser::default();
                while let Ok(Some(line)) = lines.next_line().await {
                    if let (Some(tick), Some(cb)) = (parser.feed(&line), progress.as_ref()) {
                        cb(tick);
                    }
                }
            })
        });

        let stderr_task = child.stderr.take().map(|stderr| {
            tokio::spawn(async move {
                let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    if tail.len() == STDERR_TAIL_LINES {
                        tail.pop_front();
                    }
                    tail.push_back(line);
                }
                Vec::from(tail).join("\n")
            })
        });

        enum Waited {
            Exited(std::io::Result<ExitStatus>),
            Cancelled,
            TimedOut,
        }

        let waited = tokio::select! {
            status = child.wait() => Waited::Exited(status),
            _ = cancel.cancelled() => Waited::Cancelled,
            _ = sleep_opt(self.timeout) => Waited::TimedOut,
        };

        if !matches!(waited, Waited::Exited(_)) {
            if let Err(e) = child.kill().await {
                tracing::warn!(tool = %program_name, error = %e, "Failed to kill process");
            }
        }

        if let Some(task) = stdout_task {
            let _ = task.await;
        }
        let stderr_tail = match stderr_task {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        };

        match waited {
            Waited::Exited(Ok(status)) => Ok(RunOutcome {
                status,
                stderr_tail,
            }),
            Waited::Exited(Err(e)) => Err(Error::tool(
                program_name,
                format!("I/O error waiting for process: {e}"),
            )),
            Waited::Cancelled => {
                tracing::debug!(tool = %program_name, "Process cancelled");
                Err(Error::Cancelled)
            }
            Waited::TimedOut => Err(Error::tool(
                program_name,
                format!("timed out after {:?}", self.timeout.unwrap_or_default()),
            )),
        }
    }
}

/// Stdout of a process started with [`ToolCommand::spawn_output`].
///
/// The process is killed when this reader is dropped, when the parent
/// cancellation token fires, or when the command timeout elapses. Any of
/// those ends the stream early; the bytes read so far stay valid.
#[derive(Debug)]
pub struct ChildOutput {
    stdout: ChildStdout,
    _stop: DropGuard,
}

impl AsyncRead for ChildOutput {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.stdout).poll_read(cx, buf)
    }
}

impl ToolCommand {
    /// Spawn the process and return its stdout as a byte stream.
    ///
    /// Stderr is discarded. The exit status is only logged: by the time the
    /// process exits its output has already been handed out.
    ///
    /// # Errors
    ///
    /// [`Error::Tool`] if the process cannot be spawned.
    pub fn spawn_output(&self, cancel: &CancellationToken) -> tc_core::Result<ChildOutput> {
        let program_name = self.tool_name();

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::tool(&program_name, format!("failed to spawn: {e}")))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::tool(&program_name, "stdout was not captured"))?;

        tracing::debug!(tool = %program_name, pid = ?child.id(), "Spawned streaming process");

        let stop = cancel.child_token();
        let guard = stop.clone().drop_guard();
        let timeout = self.timeout;
        tokio::spawn(async move {
            let status = tokio::select! {
                status = child.wait() => status.ok(),
                _ = stop.cancelled() => None,
                _ = sleep_opt(timeout) => None,
            };
            match status.map(|s| s.code()) {
                Some(Some(0)) => tracing::debug!(tool = %program_name, "Streaming process finished"),
                Some(Some(code)) => {
                    tracing::warn!(tool = %program_name, code, "Streaming process exited with error")
                }
                Some(None) => tracing::debug!(tool = %program_name, "Streaming process was killed"),
                None => {
                    if let Err(e) = child.kill().await {
                        tracing::warn!(tool = %program_name, error = %e, "Failed to kill process");
                    }
                    tracing::debug!(tool = %program_name, "Streaming process stopped");
                }
            }
        });

        Ok(ChildOutput {
            stdout,
            _stop: guard,
        })
    }
}

/// Classify a finished run.
///
/// Termination by signal is [`Error::ProcessKilled`]. Exit codes above
/// `max_ok_code` are [`Error::ProcessFailed`].
pub fn check_exit(tool: &str, outcome: &RunOutcome, max_ok_code: i32) -> tc_core::Result<()> {
    match outcome.status.code() {
        None => Err(Error::ProcessKilled {
            tool: tool.to_string(),
        }),
        Some(code) if code > max_ok_code => Err(Error::ProcessFailed {
            tool: tool.to_string(),
            code,
            message: outcome.stderr_tail.trim().to_string(),
        }),
        Some(_) => Ok(()),
    }
}

async fn sleep_opt(d: Option<Duration>) {
    match d {
        Some(d) => tokio::time::sleep(d).await,
        None => std::future::pending().await,
    }
}
