use async_trait::async_trait;

/// Unique identifier for a process
pub type ProcessId = u32;

/// Outcome of a termination request against a single process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminationOutcome {
    /// The termination request was delivered.
    Terminated,
    /// The process was not found (already exited).
    NotFound,
    /// The request could not be delivered.
    Failed(String),
}

/// Platform seam for delivering termination requests to the managed process.
///
/// Implementations signal by pid only; reaping the child and bounding the
/// grace period between the two calls is the caller's job.
#[async_trait]
pub trait ProcessTerminator: Send + Sync {
    /// Request graceful termination (SIGTERM on Unix).
    async fn terminate_gracefully(&self, pid: ProcessId) -> TerminationOutcome;

    /// Forced termination (SIGKILL on Unix). Idempotent; safe to call on an
    /// already-exited process.
    async fn force_kill(&self, pid: ProcessId) -> TerminationOutcome;
}
