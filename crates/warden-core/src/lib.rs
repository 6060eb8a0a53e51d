//! Warden Core - platform-independent configuration and process abstractions
//!
//! This crate provides the launch configuration, command-spec builder, error
//! types, and the process-termination seam shared across platform-specific
//! implementations, plus the deployment-dependency store read at deployment
//! time.

mod command;
mod config;
mod deploy;
mod error;
mod terminate;

pub use command::*;
pub use config::*;
pub use deploy::*;
pub use error::*;
pub use terminate::*;
