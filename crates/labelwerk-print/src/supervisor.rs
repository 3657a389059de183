// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// External tool supervision.
//
// The job script is written to a private temporary file and the label
// designer is started directly (no shell) with that file as its script
// argument.  The designer typically blocks on its own save dialog until the
// keystroke sequence dismisses it, so neither a timeout nor a non-zero exit
// status is treated as a failure here: the artifact on disk is the only
// success criterion, and everything observed is returned as diagnostics.

use std::ffi::OsString;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use tempfile::TempPath;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use labelwerk_core::config::ServiceConfig;
use labelwerk_core::error::{LabelwerkError, Result};

/// Prefix of the single script argument, e.g. `/XMLScript=C:\Temp\job.xml`.
pub const SCRIPT_ARG_PREFIX: &str = "/XMLScript=";

/// Name prefix of temporary job scripts.
const SCRIPT_FILE_PREFIX: &str = "labelwerk-job-";

/// Maximum stdout or stderr captured per stream (1 MiB).
const MAX_OUTPUT_BYTES: u64 = 1024 * 1024;

/// How long to keep draining output pipes after the process is gone.
/// A detached grandchild can hold a pipe open indefinitely.
const STREAM_DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Characters of stderr copied into job notes.
const STDERR_NOTE_CHARS: usize = 200;

/// Launches the label designer on job scripts.
#[derive(Debug, Clone)]
pub struct ToolSupervisor {
    executable: PathBuf,
    args: Vec<String>,
    scratch_dir: PathBuf,
}

impl ToolSupervisor {
    pub fn new(
        executable: impl Into<PathBuf>,
        args: Vec<String>,
        scratch_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            executable: executable.into(),
            args,
            scratch_dir: scratch_dir.into(),
        }
    }

    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(
            config.tool_executable.clone(),
            config.tool_args.clone(),
            config.scratch_dir(),
        )
    }

    /// Write `script` to a uniquely named file in the scratch directory.
    ///
    /// The returned `TempPath` deletes the file when dropped; call
    /// [`discard_script`] to delete it explicitly and log the outcome.
    #[instrument(skip_all, fields(dir = %self.scratch_dir.display()))]
    pub fn write_script(&self, script: &str) -> Result<TempPath> {
        let mut file = tempfile::Builder::new()
            .prefix(SCRIPT_FILE_PREFIX)
            .suffix(".xml")
            .tempfile_in(&self.scratch_dir)?;
        file.write_all(script.as_bytes())?;
        file.flush()?;
        let path = file.into_temp_path();
        debug!(path = %path.display(), bytes = script.len(), "job script written");
        Ok(path)
    }

    /// Start the tool on `script_path` with stdout/stderr captured.
    ///
    /// The child is killed if the returned handle is dropped before
    /// [`RunningTool::wait`] completes.
    #[instrument(skip_all, fields(executable = %self.executable.display()))]
    pub fn launch(&self, script_path: &Path) -> Result<RunningTool> {
        let mut script_arg = OsString::from(SCRIPT_ARG_PREFIX);
        script_arg.push(script_path);

        let mut child = Command::new(&self.executable)
            .args(&self.args)
            .arg(&script_arg)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| LabelwerkError::ToolLaunch {
                executable: self.executable.clone(),
                source,
            })?;

        info!(pid = child.id(), script = %script_path.display(), "external tool started");

        // Read the pipes on their own tasks so `child.wait()` can borrow the
        // child while output is still flowing.
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        Ok(RunningTool {
            child,
            stdout: tokio::spawn(read_stream(stdout)),
            stderr: tokio::spawn(read_stream(stderr)),
            started: Instant::now(),
        })
    }
}

/// Delete a job script, logging instead of failing.
pub fn discard_script(path: TempPath) {
    let shown = path.display().to_string();
    match path.close() {
        Ok(()) => debug!(path = %shown, "job script removed"),
        Err(e) => warn!(path = %shown, error = %e, "failed to remove job script"),
    }
}

/// How the tool's run ended.
#[derive(Debug)]
pub enum ToolExit {
    /// Exited on its own.
    Exited(ExitStatus),
    /// Ran past the timeout and was killed.
    TimedOut { after: Duration },
    /// The OS could not report on the process.
    WaitFailed(String),
}

/// Everything observed while the tool ran.
#[derive(Debug)]
pub struct ToolOutcome {
    pub exit: ToolExit,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

impl ToolOutcome {
    /// Diagnostic notes for the job result. Never a failure by themselves.
    pub fn notes(&self) -> Vec<String> {
        let mut notes = Vec::new();
        match &self.exit {
            ToolExit::Exited(status) if status.success() => {}
            ToolExit::Exited(status) => {
                notes.push(format!("external tool exited abnormally ({status})"));
            }
            ToolExit::TimedOut { after } => {
                let timeout = LabelwerkError::ToolTimeout {
                    secs: after.as_secs(),
                };
                notes.push(format!("{timeout}; process was terminated"));
            }
            ToolExit::WaitFailed(e) => {
                notes.push(format!("could not wait for external tool: {e}"));
            }
        }
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            let excerpt: String = stderr.chars().take(STDERR_NOTE_CHARS).collect();
            notes.push(format!("external tool stderr: {excerpt}"));
        }
        notes
    }

    pub fn timed_out(&self) -> bool {
        matches!(self.exit, ToolExit::TimedOut { .. })
    }
}

/// A started tool process with its output readers.
pub struct RunningTool {
    child: Child,
    stdout: JoinHandle<Vec<u8>>,
    stderr: JoinHandle<Vec<u8>>,
    started: Instant,
}

impl RunningTool {
    /// Wait up to `timeout` for the tool to exit, killing it if it does not.
    pub async fn wait(mut self, timeout: Duration) -> ToolOutcome {
        let exit = match tokio::time::timeout(timeout, self.child.wait()).await {
            Ok(Ok(status)) => ToolExit::Exited(status),
            Ok(Err(e)) => ToolExit::WaitFailed(e.to_string()),
            Err(_elapsed) => {
                warn!(
                    timeout_ms = timeout.as_millis() as u64,
                    "external tool timed out, terminating"
                );
                if let Err(e) = self.child.kill().await {
                    warn!(error = %e, "failed to terminate external tool");
                }
                ToolExit::TimedOut { after: timeout }
            }
        };

        let stdout = drain(&mut self.stdout).await;
        let stderr = drain(&mut self.stderr).await;
        let stdout = String::from_utf8_lossy(&stdout).into_owned();
        let stderr = String::from_utf8_lossy(&stderr).into_owned();

        if !stdout.trim().is_empty() {
            debug!(output = %stdout.trim(), "external tool stdout");
        }
        if !stderr.trim().is_empty() {
            warn!(output = %stderr.trim(), "external tool stderr");
        }

        let elapsed = self.started.elapsed();
        match &exit {
            ToolExit::Exited(status) => {
                info!(%status, elapsed_ms = elapsed.as_millis() as u64, "external tool exited")
            }
            ToolExit::TimedOut { .. } => {}
            ToolExit::WaitFailed(e) => warn!(error = %e, "lost track of external tool"),
        }

        ToolOutcome {
            exit,
            stdout,
            stderr,
            elapsed,
        }
    }
}

async fn drain(handle: &mut JoinHandle<Vec<u8>>) -> Vec<u8> {
    match tokio::time::timeout(STREAM_DRAIN_GRACE, &mut *handle).await {
        Ok(Ok(bytes)) => bytes,
        Ok(Err(e)) => {
            debug!(error = %e, "output reader task failed");
            Vec::new()
        }
        Err(_) => {
            debug!("output pipe still open after exit, abandoning it");
            handle.abort();
            Vec::new()
        }
    }
}

/// Read an entire output stream, capped at [`MAX_OUTPUT_BYTES`].
async fn read_stream<R: AsyncRead + Unpin>(handle: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(h) = handle {
        let _ = h.take(MAX_OUTPUT_BYTES).read_to_end(&mut buf).await;
    }
    buf
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn shell(dir: &Path, script: &str) -> ToolSupervisor {
        ToolSupervisor::new(
            "/bin/sh",
            vec!["-c".into(), script.into(), "tool".into()],
            dir,
        )
    }

    #[test]
    fn script_is_written_and_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let supervisor = shell(dir.path(), "true");

        let path = supervisor.write_script("<XMLScript/>").unwrap();
        let file_name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(file_name.starts_with(SCRIPT_FILE_PREFIX));
        assert!(file_name.ends_with(".xml"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<XMLScript/>");

        let kept = path.to_path_buf();
        discard_script(path);
        assert!(!kept.exists());
    }

    #[tokio::test]
    async fn tool_receives_the_script_path() {
        let dir = tempfile::tempdir().unwrap();
        // $1 is "/XMLScript=<path>"; print the file it names.
        let supervisor = shell(dir.path(), r#"cat "${1#/XMLScript=}""#);

        let script = supervisor.write_script("<XMLScript Version=\"2.0\"/>").unwrap();
        let outcome = supervisor
            .launch(&script)
            .unwrap()
            .wait(Duration::from_secs(10))
            .await;
        discard_script(script);

        assert!(matches!(outcome.exit, ToolExit::Exited(s) if s.success()));
        assert!(outcome.stdout.contains("<XMLScript Version=\"2.0\"/>"));
        assert!(outcome.notes().is_empty());
    }

    #[tokio::test]
    async fn abnormal_exit_is_a_note_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let supervisor = shell(dir.path(), "echo boom >&2; exit 3");

        let script = supervisor.write_script("x").unwrap();
        let outcome = supervisor
            .launch(&script)
            .unwrap()
            .wait(Duration::from_secs(10))
            .await;

        assert!(matches!(outcome.exit, ToolExit::Exited(s) if s.code() == Some(3)));
        let notes = outcome.notes();
        assert!(notes.iter().any(|n| n.contains("abnormally")));
        assert!(notes.iter().any(|n| n.contains("boom")));
    }

    #[tokio::test]
    async fn hung_tool_is_killed_at_the_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let supervisor = shell(dir.path(), "exec sleep 30");

        let script = supervisor.write_script("x").unwrap();
        let started = Instant::now();
        let outcome = supervisor
            .launch(&script)
            .unwrap()
            .wait(Duration::from_millis(200))
            .await;

        assert!(outcome.timed_out());
        assert!(started.elapsed() < Duration::from_secs(10));
        assert!(outcome.notes().iter().any(|n| n.contains("terminated")));
    }

    #[tokio::test]
    async fn missing_executable_is_a_launch_error() {
        let dir = tempfile::tempdir().unwrap();
        let supervisor =
            ToolSupervisor::new(dir.path().join("no-such-tool"), Vec::new(), dir.path());

        let script = supervisor.write_script("x").unwrap();
        let err = supervisor.launch(&script).err().expect("spawn must fail");
        assert!(matches!(err, LabelwerkError::ToolLaunch { .. }));
    }
}
