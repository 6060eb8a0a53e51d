//! Windows termination for the process-termination seam.

#[cfg(windows)]
mod windows_impl {
    use async_trait::async_trait;
    use tokio::process::Command;
    use tracing::{info, warn};
    use warden_core::{ProcessId, ProcessTerminator, TerminationOutcome};

    // taskkill exits with 128 when no process with the given pid exists.
    const TASKKILL_NOT_FOUND: i32 = 128;

    /// Windows terminator built on `taskkill`
    #[derive(Debug, Default)]
    pub struct WindowsTerminator;

    impl WindowsTerminator {
        pub fn new() -> Self {
            Self
        }
    }

    async fn taskkill(pid: ProcessId, force: bool) -> TerminationOutcome {
        let mut cmd = Command::new("taskkill");
        if force {
            cmd.arg("/F");
        }
        cmd.args(["/PID", &pid.to_string()]);

        match cmd.output().await {
            Ok(output) if output.status.success() => {
                info!("Requested termination of process {} (force: {})", pid, force);
                TerminationOutcome::Terminated
            }
            Ok(output) if output.status.code() == Some(TASKKILL_NOT_FOUND) => {
                info!("Process {} not found (already terminated)", pid);
                TerminationOutcome::NotFound
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                warn!("taskkill for process {} failed: {}", pid, stderr);
                TerminationOutcome::Failed(stderr)
            }
            Err(e) => {
                warn!("Failed to run taskkill for process {}: {}", pid, e);
                TerminationOutcome::Failed(e.to_string())
            }
        }
    }

    #[async_trait]
    impl ProcessTerminator for WindowsTerminator {
        async fn terminate_gracefully(&self, pid: ProcessId) -> TerminationOutcome {
            taskkill(pid, false).await
        }

        async fn force_kill(&self, pid: ProcessId) -> TerminationOutcome {
            taskkill(pid, true).await
        }
    }
}

#[cfg(windows)]
pub use windows_impl::WindowsTerminator;

// Stub so the crate still compiles when pulled in off-Windows
#[cfg(not(windows))]
pub struct WindowsTerminator;

#[cfg(not(windows))]
impl WindowsTerminator {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(not(windows))]
impl Default for WindowsTerminator {
    fn default() -> Self {
        Self::new()
    }
}
