use anyhow::{Context, Result};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Shared handle to the in-flight ffmpeg child, so a stop request can reach
/// the process from outside the run loop.
pub type ProcessSlot = Arc<Mutex<Option<Child>>>;

/// How long a terminated child gets to exit before it is killed outright.
const TERMINATE_GRACE: Duration = Duration::from_secs(5);

/// Keep this much of the end of stderr for diagnostics.
const STDERR_TAIL_CHARS: usize = 2000;

#[derive(Debug)]
pub struct EncodeOutcome {
    pub status: ExitStatus,
    pub stderr_tail: String,
}

/// Spawn the command, park the child in the slot while it runs, and reap it.
/// The slot is cleared before returning on every path.
pub async fn run_encode(args: &[String], slot: &ProcessSlot) -> Result<EncodeOutcome> {
    let (program, rest) = args
        .split_first()
        .context("Encode command is empty")?;

    let mut command = Command::new(program);
    command
        .args(rest)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = command
        .spawn()
        .with_context(|| format!("Failed to spawn {}", program))?;

    // Both pipes must be drained or a chatty child blocks on a full buffer.
    let stdout_task = child.stdout.take().map(|mut pipe| {
        tokio::spawn(async move {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf).await;
        })
    });

    let stderr = child.stderr.take();
    let stderr_task = stderr.map(|mut pipe| {
        tokio::spawn(async move {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf).await;
            String::from_utf8_lossy(&buf).into_owned()
        })
    });

    debug!("Spawned {} (pid {:?})", program, child.id());
    *slot.lock().await = Some(child);

    // The child lives in the slot so terminate() can signal it; poll instead
    // of holding the lock across an await.
    let status = loop {
        {
            let mut guard = slot.lock().await;
            if let Some(child) = guard.as_mut() {
                match child.try_wait() {
                    Ok(Some(status)) => break status,
                    Ok(None) => {}
                    Err(e) => {
                        *guard = None;
                        return Err(e).context("Failed to wait for child process");
                    }
                }
            } else {
                anyhow::bail!("Child process slot was cleared mid-run");
            }
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    };

    *slot.lock().await = None;

    if let Some(task) = stdout_task {
        let _ = task.await;
    }
    let stderr_output = match stderr_task {
        Some(task) => task.await.unwrap_or_default(),
        None => String::new(),
    };

    Ok(EncodeOutcome {
        status,
        stderr_tail: tail(&stderr_output, STDERR_TAIL_CHARS),
    })
}

/// Ask the parked child to exit: SIGTERM first on unix, then a hard kill if
/// it is still alive after the grace period. No-op when the slot is empty.
pub async fn terminate(slot: &ProcessSlot) {
    {
        let mut guard = slot.lock().await;
        let Some(child) = guard.as_mut() else {
            return;
        };

        #[cfg(unix)]
        if let Some(pid) = child.id() {
            debug!("Sending SIGTERM to pid {}", pid);
            unsafe {
                libc::kill(pid as libc::pid_t, libc::SIGTERM);
            }
        }

        #[cfg(not(unix))]
        if let Err(e) = child.start_kill() {
            warn!("Failed to kill child process: {}", e);
        }
    }

    let exited = tokio::time::timeout(TERMINATE_GRACE, async {
        loop {
            {
                let mut guard = slot.lock().await;
                match guard.as_mut() {
                    None => return,
                    Some(child) => {
                        if matches!(child.try_wait(), Ok(Some(_))) {
                            return;
                        }
                    }
                }
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    })
    .await;

    if exited.is_err() {
        let mut guard = slot.lock().await;
        if let Some(child) = guard.as_mut() {
            warn!("Child did not exit after SIGTERM, killing");
            if let Err(e) = child.start_kill() {
                warn!("Failed to kill child process: {}", e);
            }
        }
    }
}

fn tail(s: &str, max_chars: usize) -> String {
    let count = s.chars().count();
    if count <= max_chars {
        return s.to_string();
    }
    s.chars().skip(count - max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tail_short_string_unchanged() {
        assert_eq!(tail("hello", 2000), "hello");
    }

    #[test]
    fn test_tail_truncates_from_front() {
        let long: String = "ab".repeat(2000);
        let tailed = tail(&long, 2000);
        assert_eq!(tailed.chars().count(), 2000);
        assert!(long.ends_with(&tailed));
    }

    #[tokio::test]
    async fn test_terminate_empty_slot_is_noop() {
        let slot: ProcessSlot = Arc::new(Mutex::new(None));
        terminate(&slot).await;
        assert!(slot.lock().await.is_none());
    }

    #[tokio::test]
    async fn test_run_encode_missing_program_fails() {
        let slot: ProcessSlot = Arc::new(Mutex::new(None));
        let args = vec!["definitely-not-a-real-binary-4242".to_string()];
        let result = run_encode(&args, &slot).await;
        assert!(result.is_err());
        assert!(slot.lock().await.is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_encode_captures_exit_status() {
        let slot: ProcessSlot = Arc::new(Mutex::new(None));
        let args = vec!["false".to_string()];
        let outcome = run_encode(&args, &slot).await.expect("should spawn");
        assert!(!outcome.status.success());
        assert!(slot.lock().await.is_none());
    }
}
