use crate::admin::{AdminClient, ContainerDescription};
use crate::process::ServerProcess;
use crate::sink::OutputSink;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{info, warn};
use warden_core::{CommandSpec, ServerConfig, Topology, WardenError};

/// Lifecycle phases of a managed server. `Stopped` and `Failed` are
/// terminal: a controller is not reusable after either.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    NotStarted,
    Starting,
    Running,
    Stopping,
    Stopped,
    Failed,
}

/// Controls exactly one server process through its lifetime.
///
/// `start`, `stop`, and `kill` on the same controller are serialized, so a
/// stop can never race a start that is still waiting for readiness. State
/// reads (`state`, `is_running`, `describe`) stay cheap and never wait on an
/// in-flight lifecycle operation.
pub struct ServerController {
    config: ServerConfig,
    spec: CommandSpec,
    admin: AdminClient,
    sink: OutputSink,
    // Serializes the lifecycle operations; never held across state reads.
    op_lock: tokio::sync::Mutex<()>,
    state: Mutex<LifecycleState>,
    process: Mutex<Option<ServerProcess>>,
    description: Mutex<Option<ContainerDescription>>,
}

impl ServerController {
    /// Create a controller for the installation described by `config`.
    ///
    /// Fails with [`WardenError::InvalidHome`] when the installation root is
    /// not recognized; nothing is launched until [`start`](Self::start).
    pub fn new(config: ServerConfig, sink: OutputSink) -> Result<Self, WardenError> {
        config.validate().map_err(|e| WardenError::Configuration {
            message: e.to_string(),
        })?;

        let spec = CommandSpec::for_config(&config)?;
        let admin = AdminClient::new(
            config.topology,
            config.management_host(),
            config.management_port,
        )?;

        Ok(Self {
            config,
            spec,
            admin,
            sink,
            op_lock: tokio::sync::Mutex::new(()),
            state: Mutex::new(LifecycleState::NotStarted),
            process: Mutex::new(None),
            description: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn topology(&self) -> Topology {
        self.config.topology
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.lock().unwrap()
    }

    /// One-line identification used in diagnostics.
    pub fn summary(&self) -> String {
        format!(
            "{} server at {}",
            self.config.topology,
            self.config.home.display()
        )
    }

    /// Launch the server and wait until it reports ready.
    ///
    /// On any failure the spawned process is torn down before the original
    /// error is returned, and the controller becomes unusable.
    pub async fn start(&self, timeout: Duration) -> Result<(), WardenError> {
        let _op = self.op_lock.lock().await;

        {
            let mut state = self.state.lock().unwrap();
            if *state != LifecycleState::NotStarted {
                return Err(WardenError::AlreadyStarted);
            }
            *state = LifecycleState::Starting;
        }

        info!("Starting {}", self.summary());

        let mut process = match ServerProcess::spawn(&self.spec, &self.sink) {
            Ok(process) => process,
            Err(e) => {
                self.set_state(LifecycleState::Failed);
                return Err(e);
            }
        };

        match self
            .admin
            .wait_until_ready(&mut process, timeout, self.config.poll_interval)
            .await
        {
            Ok(()) => {
                *self.process.lock().unwrap() = Some(process);
                self.set_state(LifecycleState::Running);
                info!("Server is up");
                Ok(())
            }
            Err(e) => {
                warn!("Startup failed ({}), destroying the process", e);
                process.destroy(self.config.destroy_grace).await;
                self.set_state(LifecycleState::Failed);
                Err(e)
            }
        }
    }

    /// Stop the server: graceful shutdown over the management protocol,
    /// unconditionally followed by process destruction.
    ///
    /// Idempotent; a no-op unless the server is running.
    pub async fn stop(&self) {
        let _op = self.op_lock.lock().await;

        {
            let mut state = self.state.lock().unwrap();
            if *state != LifecycleState::Running {
                return;
            }
            *state = LifecycleState::Stopping;
        }
        self.description.lock().unwrap().take();

        if let Err(e) = self.admin.shutdown().await {
            warn!("Graceful shutdown failed, destroying the process directly: {}", e);
        }

        let process = self.process.lock().unwrap().take();
        if let Some(mut process) = process {
            process.destroy(self.config.destroy_grace).await;
        }

        self.set_state(LifecycleState::Stopped);
        info!("Server stopped");
    }

    /// Forcibly terminate the server without a graceful shutdown exchange.
    ///
    /// Idempotent; a no-op unless the server is running.
    pub async fn kill(&self) {
        let _op = self.op_lock.lock().await;

        {
            let mut state = self.state.lock().unwrap();
            if *state != LifecycleState::Running {
                return;
            }
            *state = LifecycleState::Stopping;
        }
        self.description.lock().unwrap().take();

        let process = self.process.lock().unwrap().take();
        if let Some(mut process) = process {
            process.force_kill().await;
        }

        self.set_state(LifecycleState::Stopped);
        info!("Server killed");
    }

    /// Whether the server currently reports itself fully started.
    ///
    /// Probes the management endpoint only while the controller believes the
    /// server is running; otherwise answers `false` without I/O.
    pub async fn is_running(&self) -> bool {
        if self.state() != LifecycleState::Running {
            return false;
        }
        self.admin.is_running().await
    }

    /// Identifying information about the running container, cached after the
    /// first successful query and invalidated when the server stops.
    pub async fn describe(&self) -> Result<ContainerDescription, WardenError> {
        if self.state() != LifecycleState::Running {
            return Err(WardenError::NotRunning);
        }

        if let Some(description) = self.description.lock().unwrap().clone() {
            return Ok(description);
        }

        let description = self.admin.describe().await?;
        *self.description.lock().unwrap() = Some(description.clone());
        Ok(description)
    }

    fn set_state(&self, state: LifecycleState) {
        *self.state.lock().unwrap() = state;
    }
}

impl std::fmt::Debug for ServerController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerController")
            .field("topology", &self.config.topology)
            .field("home", &self.config.home)
            .field("state", &self.state())
            .finish()
    }
}
