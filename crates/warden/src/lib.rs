//! Warden - lifecycle control for WildFly-style application server processes
//!
//! A [`ServerController`] launches one server instance (standalone or
//! domain), waits for the management endpoint to report it fully started,
//! and later stops it gracefully or kills it forcibly. The server's console
//! output is continuously pumped into a caller-supplied [`OutputSink`], and a
//! [`Supervisor`] slot guarantees at most one active controller at a time.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use warden::{OutputSink, ServerConfig, ServerController, Supervisor};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ServerConfig::builder().home("/opt/wildfly").build()?;
//! let timeout = config.startup_timeout;
//!
//! let controller = Arc::new(ServerController::new(config, OutputSink::stdout())?);
//! let supervisor = Supervisor::new();
//!
//! let running = supervisor.start_published(controller, timeout).await?;
//! println!("{}", running.describe().await?);
//! supervisor.stop_published().await;
//! # Ok(())
//! # }
//! ```

mod admin;
mod controller;
mod platform;
mod process;
mod sink;
mod supervisor;

pub use admin::{AdminClient, ContainerDescription, ServerStatus};
pub use controller::{LifecycleState, ServerController};
pub use process::ServerProcess;
pub use sink::OutputSink;
pub use supervisor::Supervisor;

// Re-export core functionality
pub use warden_core::*;
