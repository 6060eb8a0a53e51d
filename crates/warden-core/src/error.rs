use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Error types for server lifecycle operations
#[derive(Error, Debug)]
pub enum WardenError {
    #[error("{} is not a server installation (no {} found)", .home.display(), crate::MODULE_LAUNCHER_JAR)]
    InvalidHome { home: PathBuf },

    #[error("configuration error: {message}")]
    Configuration { message: String },

    #[error("failed to spawn the server process")]
    Spawn {
        #[source]
        source: std::io::Error,
    },

    #[error("server did not report ready within {} seconds", .timeout.as_secs())]
    StartupTimeout { timeout: Duration },

    #[error("server process exited before it became ready ({status})")]
    ProcessDied { status: std::process::ExitStatus },

    #[error("the controller has already been started")]
    AlreadyStarted,

    #[error("another server is already active: {current}")]
    AlreadyRunningElsewhere { current: String },

    #[error("graceful shutdown request could not be delivered")]
    ShutdownUnreachable {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("the server is not running")]
    NotRunning,

    #[error("management operation failed: {message}")]
    Management {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl WardenError {
    pub fn management_with_source<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        WardenError::Management {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn management_with_message(message: impl Into<String>) -> Self {
        WardenError::Management {
            message: message.into(),
            source: None,
        }
    }

    pub fn shutdown_unreachable<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        WardenError::ShutdownUnreachable {
            source: Box::new(source),
        }
    }

    /// Check if this error terminated a start attempt
    pub fn is_startup_failure(&self) -> bool {
        matches!(
            self,
            WardenError::Spawn { .. }
                | WardenError::StartupTimeout { .. }
                | WardenError::ProcessDied { .. }
        )
    }

    /// Check if this error is recovered locally during a stop (the stop still
    /// proceeds to destroy the process)
    pub fn is_recovered_on_stop(&self) -> bool {
        matches!(self, WardenError::ShutdownUnreachable { .. })
    }
}
