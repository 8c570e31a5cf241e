//! Sandboxed execution of authorized commands.
//!
//! Runs a command under `/bin/bash -c` with a best-effort virtual-memory
//! ceiling, a hard wall-clock timeout, and merged output capture. On
//! timeout the process is killed outright and whatever output was already
//! buffered is still returned; a timeout is never reported as success.

use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Environment variable overriding the memory ceiling, in megabytes.
pub const MEMORY_LIMIT_ENV: &str = "CMDGATE_MEMORY_LIMIT_MB";

const DEFAULT_MEMORY_LIMIT_MB: u64 = 2048;

// Output substrings that indicate the child died of memory exhaustion.
const OOM_MARKERS: &[&str] = &[
    "Killed",
    "MemoryError",
    "Cannot allocate memory",
    "std::bad_alloc",
];

/// Captured result of one sandboxed execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Standard output with standard error merged in, trimmed.
    pub output: String,
    /// Exit code; `None` when the process timed out or died on a signal.
    pub exit_code: Option<i32>,
    /// True when the process was killed on timeout expiry.
    pub timed_out: bool,
}

/// Current memory ceiling in megabytes.
pub fn memory_limit_mb() -> u64 {
    std::env::var(MEMORY_LIMIT_ENV)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_MEMORY_LIMIT_MB)
}

/// `ulimit` prefix prepended to every sandboxed command. Best-effort: some
/// platforms reject `ulimit -v`, hence the `|| true`.
pub fn ulimit_prefix() -> String {
    format!("ulimit -v {} || true; ", memory_limit_mb() * 1024)
}

/// Execute an authorized command, returning captured output, exit status
/// and a timed-out flag.
///
/// The only error this returns is a failure to spawn or reap the shell
/// itself ("never ran"); a command that runs and fails comes back as
/// `Ok` with a non-zero exit code.
pub async fn run_sandboxed(cmd: &str, timeout_secs: u64) -> Result<ExecutionResult> {
    let protected_cmd = format!("{}{}", ulimit_prefix(), cmd);
    debug!(timeout_secs, "spawning sandboxed command");

    let mut child = Command::new("/bin/bash")
        .arg("-c")
        .arg(&protected_cmd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .context("failed to spawn /bin/bash; ensure bash is installed")?;

    let mut stdout = child.stdout.take().context("child stdout not captured")?;
    let mut stderr = child.stderr.take().context("child stderr not captured")?;

    // Drain both pipes concurrently so a chatty child can never fill one
    // and deadlock against our wait(). The readers hit EOF once the child
    // exits or is killed, preserving partial output on timeout.
    let stdout_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Err(e) = stdout.read_to_end(&mut buf).await {
            warn!("error draining child stdout: {e}");
        }
        buf
    });
    let stderr_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Err(e) = stderr.read_to_end(&mut buf).await {
            warn!("error draining child stderr: {e}");
        }
        buf
    });

    let wait_result = timeout(Duration::from_secs(timeout_secs), child.wait()).await;
    let (timed_out, exit_code, killed_by_signal) =
        match wait_result {
            Ok(status) => {
                let status = status.context("failed to wait for child process")?;
                let signal = exit_signal(&status);
                (false, status.code(), signal)
            }
            Err(_) => {
                debug!("command timed out, killing child");
                if let Err(e) = child.start_kill() {
                    warn!("failed to kill timed-out child: {e}");
                }
                if let Err(e) = child.wait().await {
                    warn!("failed to reap timed-out child: {e}");
                }
                (true, None, None)
            }
        };

    let mut bytes = stdout_task.await.unwrap_or_default();
    bytes.extend_from_slice(&stderr_task.await.unwrap_or_default());
    let mut output = String::from_utf8_lossy(&bytes).trim().to_string();

    if !timed_out {
        output = append_oom_hint(output, exit_code, killed_by_signal);
    }

    Ok(ExecutionResult {
        output,
        exit_code: if timed_out { None } else { exit_code },
        timed_out,
    })
}

#[cfg(unix)]
fn exit_signal(status: &std::process::ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn exit_signal(_status: &std::process::ExitStatus) -> Option<i32> {
    None
}

/// Check the exit status and output for out-of-memory signatures and, if
/// found, append a hint naming the configured ceiling so the caller can
/// self-correct instead of retrying blindly.
fn append_oom_hint(output: String, exit_code: Option<i32>, signal: Option<i32>) -> String {
    // 137 = 128 + SIGKILL; the kernel OOM killer and ulimit both use it.
    let oom_exit = exit_code == Some(137) || signal == Some(9);
    let oom_output = OOM_MARKERS.iter().any(|marker| output.contains(marker));
    if !oom_exit && !oom_output {
        return output;
    }

    format!(
        "{output}\n\n[OOM] The command appears to have run out of memory \
         (current limit: {} MB). Narrow the output with filters, head/tail or \
         field selection, or raise {MEMORY_LIMIT_ENV}.",
        memory_limit_mb()
    )
}
