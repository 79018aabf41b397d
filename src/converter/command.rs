//! Subprocess execution with a timeout.
//!
//! The converter never goes through a shell: the program and its arguments
//! are passed to the OS as-is, so uploaded file names cannot inject commands.

use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::path::Path;
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::warn;

/// Captured result of one subprocess run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandOutput {
    /// Standard output
    pub stdout: String,

    /// Standard error
    pub stderr: String,

    /// Exit code (0 = success, -1 when killed or terminated by a signal)
    pub exit_code: i32,

    /// Execution duration in milliseconds
    pub duration_ms: u64,

    /// Whether the process was killed for exceeding its timeout
    pub timed_out: bool,
}

impl CommandOutput {
    /// Check if the command succeeded (exit code 0)
    pub fn success(&self) -> bool {
        self.exit_code == 0 && !self.timed_out
    }

    /// Get combined output (stdout + stderr)
    pub fn combined_output(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else if self.stdout.is_empty() {
            self.stderr.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

/// Run `program` with `args`, killing it once `timeout_ms` elapses.
///
/// Spawn failures (missing binary, permissions) are returned as `Err`;
/// everything after a successful spawn is reported through `CommandOutput`.
pub async fn run_command<I, S>(
    program: &Path,
    args: I,
    timeout_ms: u64,
) -> std::io::Result<CommandOutput>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let start = Instant::now();

    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    // Own process group, so a timeout can take down launcher descendants too
    // (`soffice` hands off to `oosplash` -> `soffice.bin`).
    #[cfg(unix)]
    cmd.process_group(0);

    let child = cmd.spawn()?;
    let pid = child.id();

    match timeout(Duration::from_millis(timeout_ms), child.wait_with_output()).await {
        Ok(output) => {
            let output = output?;
            Ok(CommandOutput {
                stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                exit_code: output.status.code().unwrap_or(-1),
                duration_ms: start.elapsed().as_millis() as u64,
                timed_out: false,
            })
        }
        // Dropping the wait future drops the child, which kills it; the rest
        // of its group goes with the signal below.
        Err(_) => {
            if let Some(pid) = pid {
                kill_process_group(pid);
            }
            Ok(CommandOutput {
                stdout: String::new(),
                stderr: format!("Command timed out after {}ms", timeout_ms),
                exit_code: -1,
                duration_ms: timeout_ms,
                timed_out: true,
            })
        }
    }
}

#[cfg(unix)]
fn kill_process_group(pid: u32) {
    // The child leads its group, so the negative pid reaches every member.
    let result = unsafe { libc::kill(-(pid as libc::pid_t), libc::SIGKILL) };
    if result != 0 {
        let error = std::io::Error::last_os_error();
        // ESRCH: the whole group already exited
        if error.raw_os_error() != Some(libc::ESRCH) {
            warn!(pid, %error, "Failed to kill converter process group");
        }
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: u32) {}
