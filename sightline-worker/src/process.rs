//! External process execution
//!
//! Runs a [`CommandSpec`] to completion and forwards its output to the job
//! log, either once after exit or line by line while the process runs.

use sightline_core::domain::process::{ExitPolicy, ProcessResult};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::command::CommandSpec;
use crate::error::{Result, TaskError};
use crate::log::JobLog;

/// How output reaches the job log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Collect everything, write it to the log once after exit
    WaitForExit,
    /// Forward each stdout/stderr line as it arrives
    Stream,
}

/// Runs external processes for tasks
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }

    /// Runs `spec` and waits for it to exit
    ///
    /// A nonzero exit status is not an error here; callers decide with
    /// [`enforce_exit_policy`] or their own check.
    ///
    /// # Returns
    /// The exit code (`-1` when killed by a signal) and the captured output
    pub async fn run(
        &self,
        spec: &CommandSpec,
        mode: RunMode,
        log: &dyn JobLog,
    ) -> Result<ProcessResult> {
        info!("Running command: {}", spec.display());

        let result = match mode {
            RunMode::WaitForExit => self.run_to_exit(spec, log).await?,
            RunMode::Stream => self.run_streaming(spec, log).await?,
        };

        debug!("{} exited with status {}", spec.program, result.exit_code);
        Ok(result)
    }

    /// Runs `spec` and returns its stdout without touching the job log
    pub async fn capture_stdout(&self, spec: &CommandSpec) -> Result<(i32, String)> {
        debug!("Capturing output of: {}", spec.display());

        let output = command(spec)
            .output()
            .await
            .map_err(|source| spawn_error(spec, source))?;

        Ok((
            output.status.code().unwrap_or(-1),
            String::from_utf8_lossy(&output.stdout).into_owned(),
        ))
    }

    async fn run_to_exit(&self, spec: &CommandSpec, log: &dyn JobLog) -> Result<ProcessResult> {
        let output = command(spec)
            .output()
            .await
            .map_err(|source| spawn_error(spec, source))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let combined_output = format!("{}\n{}", stdout, stderr);

        log.write(&combined_output);

        Ok(ProcessResult {
            exit_code: output.status.code().unwrap_or(-1),
            combined_output,
        })
    }

    async fn run_streaming(&self, spec: &CommandSpec, log: &dyn JobLog) -> Result<ProcessResult> {
        let mut child = command(spec)
            .spawn()
            .map_err(|source| spawn_error(spec, source))?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let mut out = LineDrain::new(stdout);
        let mut err = LineDrain::new(stderr);
        let mut combined_output = String::new();

        while !(out.done && err.done) {
            tokio::select! {
                line = out.next_line(), if !out.done => {
                    if let Some(line) = line {
                        forward(log, &mut combined_output, &line);
                    }
                }
                line = err.next_line(), if !err.done => {
                    if let Some(line) = line {
                        forward(log, &mut combined_output, &line);
                    }
                }
            }
        }

        let status = child.wait().await.map_err(|source| {
            TaskError::io(format!("Failed to wait for {}", spec.program), source)
        })?;

        Ok(ProcessResult {
            exit_code: status.code().unwrap_or(-1),
            combined_output,
        })
    }
}

/// Applies an exit policy to a finished process
///
/// `Checked` turns a nonzero status into [`TaskError::ToolFailed`];
/// `Unchecked` writes a warning to the job log and lets the task carry on.
pub fn enforce_exit_policy(
    result: &ProcessResult,
    policy: ExitPolicy,
    program: &str,
    log: &dyn JobLog,
) -> Result<()> {
    if result.success() {
        return Ok(());
    }

    match policy {
        ExitPolicy::Checked => Err(TaskError::ToolFailed {
            program: program.to_string(),
            exit_code: result.exit_code,
            output: result.combined_output.clone(),
        }),
        ExitPolicy::Unchecked => {
            log.warn(&format!(
                "{} exited with status {}, continuing",
                program, result.exit_code
            ));
            Ok(())
        }
    }
}

fn command(spec: &CommandSpec) -> Command {
    let mut cmd = Command::new(&spec.program);
    cmd.args(&spec.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    if let Some(cwd) = &spec.cwd {
        cmd.current_dir(cwd);
    }
    for (key, value) in &spec.env {
        cmd.env(key, value);
    }

    cmd
}

fn spawn_error(spec: &CommandSpec, source: std::io::Error) -> TaskError {
    TaskError::Spawn {
        program: spec.program.clone(),
        source,
    }
}

fn forward(log: &dyn JobLog, combined: &mut String, line: &str) {
    log.write(line);
    combined.push_str(line);
    combined.push('\n');
}

/// Line reader over one child pipe that tolerates invalid UTF-8
struct LineDrain<R> {
    reader: Option<BufReader<R>>,
    buf: Vec<u8>,
    done: bool,
}

impl<R: AsyncRead + Unpin> LineDrain<R> {
    fn new(pipe: Option<R>) -> Self {
        let done = pipe.is_none();
        Self {
            reader: pipe.map(BufReader::new),
            buf: Vec::new(),
            done,
        }
    }

    /// Next line, or `None` once the pipe is closed
    ///
    /// Partial reads stay in `buf`, so a cancelled call resumes where it
    /// stopped. An unterminated last line is returned at end of stream.
    async fn next_line(&mut self) -> Option<String> {
        let Some(reader) = self.reader.as_mut() else {
            self.done = true;
            return None;
        };

        match reader.read_until(b'\n', &mut self.buf).await {
            Ok(0) => {
                self.done = true;
                self.take_line()
            }
            Ok(_) => self.take_line(),
            Err(e) => {
                warn!("Failed to read process output: {}", e);
                self.done = true;
                self.take_line()
            }
        }
    }

    fn take_line(&mut self) -> Option<String> {
        if self.buf.is_empty() {
            return None;
        }

        let line = String::from_utf8_lossy(&self.buf)
            .trim_end_matches(['\n', '\r'])
            .to_string();
        self.buf.clear();
        Some(line)
    }
}
