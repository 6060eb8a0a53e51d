//! Unix signal delivery for the process-termination seam.

#[cfg(unix)]
mod unix_impl {
    use async_trait::async_trait;
    use nix::sys::signal::{self, Signal};
    use nix::unistd::Pid as NixPid;
    use tracing::{info, warn};
    use warden_core::{ProcessId, ProcessTerminator, TerminationOutcome};

    /// Unix terminator delivering SIGTERM/SIGKILL by pid
    #[derive(Debug, Default)]
    pub struct UnixTerminator;

    impl UnixTerminator {
        pub fn new() -> Self {
            Self
        }
    }

    fn deliver(pid: ProcessId, sig: Signal) -> TerminationOutcome {
        match signal::kill(NixPid::from_raw(pid as i32), sig) {
            Ok(()) => {
                info!("Sent {} to process {}", sig, pid);
                TerminationOutcome::Terminated
            }
            Err(nix::errno::Errno::ESRCH) => {
                info!("Process {} not found (already terminated)", pid);
                TerminationOutcome::NotFound
            }
            Err(nix::errno::Errno::EPERM) => {
                warn!("Permission denied to signal process {}", pid);
                TerminationOutcome::Failed("permission denied".to_string())
            }
            Err(e) => {
                warn!("Failed to send {} to process {}: {}", sig, pid, e);
                TerminationOutcome::Failed(format!("{sig} failed: {e}"))
            }
        }
    }

    #[async_trait]
    impl ProcessTerminator for UnixTerminator {
        async fn terminate_gracefully(&self, pid: ProcessId) -> TerminationOutcome {
            deliver(pid, Signal::SIGTERM)
        }

        async fn force_kill(&self, pid: ProcessId) -> TerminationOutcome {
            deliver(pid, Signal::SIGKILL)
        }
    }
}

#[cfg(unix)]
pub use unix_impl::UnixTerminator;

// Stub so the crate still compiles when pulled in off-Unix
#[cfg(not(unix))]
pub struct UnixTerminator;

#[cfg(not(unix))]
impl UnixTerminator {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(not(unix))]
impl Default for UnixTerminator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use warden_core::{ProcessTerminator, TerminationOutcome};

    #[tokio::test]
    async fn test_signalling_a_dead_pid_reports_not_found() {
        // Spawn and reap a short-lived child so its pid is free.
        let mut child = std::process::Command::new("true").spawn().unwrap();
        let pid = child.id();
        child.wait().unwrap();

        let terminator = UnixTerminator::new();
        // The pid may have been recycled; accept either outcome, but the
        // call itself must not error out.
        let outcome = terminator.force_kill(pid).await;
        assert!(matches!(
            outcome,
            TerminationOutcome::NotFound | TerminationOutcome::Terminated
        ));
    }

    #[tokio::test]
    async fn test_graceful_then_forced_terminates_a_child() {
        let child = std::process::Command::new("sleep").arg("30").spawn().unwrap();
        let pid = child.id();

        let terminator = UnixTerminator::new();
        assert_eq!(
            terminator.terminate_gracefully(pid).await,
            TerminationOutcome::Terminated
        );
        assert_eq!(terminator.force_kill(pid).await, TerminationOutcome::Terminated);

        // Reap so the test leaves no zombie behind.
        let mut child = child;
        child.wait().unwrap();
    }
}
