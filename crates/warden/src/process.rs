use crate::platform::{platform_name, platform_terminator};
use crate::sink::OutputSink;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tracing::{info, warn};
use warden_core::{CommandSpec, ProcessId, ProcessTerminator, TerminationOutcome, WardenError};

/// An exclusively owned server OS process.
///
/// The process's stdout and stderr are pumped into the caller-supplied sink
/// by background tasks for the whole lifetime of the process, so a slow (or
/// absent) consumer never stalls the server on a full pipe.
pub struct ServerProcess {
    child: Child,
    program: String,
    terminator: Box<dyn ProcessTerminator>,
}

impl ServerProcess {
    /// Launch the process described by `spec`, wiring its output into `sink`.
    pub fn spawn(spec: &CommandSpec, sink: &OutputSink) -> Result<Self, WardenError> {
        let mut cmd = Command::new(spec.program());
        cmd.args(spec.argv())
            .current_dir(spec.home())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        for (key, value) in spec.env() {
            cmd.env(key, value);
        }

        let mut child = cmd.spawn().map_err(|source| WardenError::Spawn { source })?;

        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(pump(stdout, sink.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(pump(stderr, sink.clone()));
        }

        let program = spec.program().display().to_string();
        if let Some(pid) = child.id() {
            info!(
                "Spawned server process {} (PID: {}) on {}",
                program,
                pid,
                platform_name()
            );
        }

        Ok(Self {
            child,
            program,
            terminator: platform_terminator(),
        })
    }

    /// Process id, `None` once the process has been reaped.
    pub fn pid(&self) -> Option<ProcessId> {
        self.child.id()
    }

    /// Non-blocking exit probe.
    pub fn try_status(&mut self) -> std::io::Result<Option<ExitStatus>> {
        self.child.try_wait()
    }

    /// Wait for the process to exit.
    pub async fn wait(&mut self) -> std::io::Result<ExitStatus> {
        self.child.wait().await
    }

    /// Request graceful termination, escalating to a forced kill if the
    /// process has not exited within `grace`.
    ///
    /// Best-effort: never fails, and never leaves an unreaped child behind.
    pub async fn destroy(&mut self, grace: Duration) {
        if let Ok(Some(status)) = self.child.try_wait() {
            info!("Server process {} already exited ({})", self.program, status);
            return;
        }

        let Some(pid) = self.child.id() else {
            return;
        };

        match self.terminator.terminate_gracefully(pid).await {
            TerminationOutcome::Terminated => {
                match tokio::time::timeout(grace, self.child.wait()).await {
                    Ok(Ok(status)) => {
                        info!("Server process {} exited ({})", self.program, status);
                        return;
                    }
                    Ok(Err(e)) => warn!("Error waiting for process {}: {}", pid, e),
                    Err(_) => warn!(
                        "Process {} still alive {}ms after termination request",
                        pid,
                        grace.as_millis()
                    ),
                }
            }
            TerminationOutcome::NotFound => {
                let _ = self.child.try_wait();
                return;
            }
            TerminationOutcome::Failed(reason) => {
                warn!("Graceful termination of process {} failed: {}", pid, reason);
            }
        }

        self.force_kill().await;
    }

    /// Immediate forced termination. Idempotent; safe to call on an
    /// already-exited process.
    pub async fn force_kill(&mut self) {
        if let Ok(Some(_)) = self.child.try_wait() {
            return;
        }

        if let Some(pid) = self.child.id() {
            let _ = self.terminator.force_kill(pid).await;
        }

        // Also kill through the handle, which reaps the child.
        if let Err(e) = self.child.kill().await {
            warn!("Handle kill cleanup failed: {}", e);
        }
    }
}

impl std::fmt::Debug for ServerProcess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerProcess")
            .field("program", &self.program)
            .field("pid", &self.child.id())
            .finish()
    }
}

async fn pump(mut reader: impl AsyncRead + Unpin, sink: OutputSink) {
    let mut buf = [0u8; 8192];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => sink.write_all(&buf[..n]).await,
        }
    }
}
