use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Which of the two supported server arrangements a launch targets.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Topology {
    /// A single self-contained server instance.
    #[default]
    Standalone,
    /// A coordinated multi-node instance managed through a host controller.
    Domain,
}

impl std::fmt::Display for Topology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Topology::Standalone => f.write_str("standalone"),
            Topology::Domain => f.write_str("domain"),
        }
    }
}

/// Launch configuration for a managed server instance.
#[derive(Debug, Clone, PartialEq, Builder)]
#[builder(setter(into, strip_option))]
pub struct ServerConfig {
    /// Root of the server installation. Must contain the module launcher jar.
    pub home: PathBuf,

    #[builder(default)]
    pub topology: Topology,

    /// Address the server's public interfaces bind to.
    #[builder(default = "default_bind_address()")]
    pub bind_address: String,

    /// Address the management interface binds to. Falls back to
    /// `bind_address` when unset.
    #[builder(default)]
    pub management_address: Option<String>,

    /// Port of the management endpoint.
    #[builder(default = "default_management_port()")]
    pub management_port: u16,

    /// JVM installation used to launch the server; `java` from the `PATH`
    /// when unset.
    #[builder(default)]
    pub java_home: Option<PathBuf>,

    /// Extra JVM options placed ahead of the launcher arguments.
    #[builder(default)]
    #[builder(setter(custom))]
    pub java_opts: Vec<String>,

    /// Grace period granted to the process between a termination request and
    /// a forced kill.
    #[builder(default = "default_destroy_grace()")]
    pub destroy_grace: Duration,

    /// Interval between readiness probes while waiting for startup.
    #[builder(default = "default_poll_interval()")]
    pub poll_interval: Duration,

    /// Default deadline for `start` when the caller does not supply one.
    #[builder(default = "default_startup_timeout()")]
    pub startup_timeout: Duration,
}

impl ServerConfig {
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    /// Host the management endpoint is reachable on.
    pub fn management_host(&self) -> &str {
        self.management_address
            .as_deref()
            .unwrap_or(&self.bind_address)
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.poll_interval.is_zero() {
            return Err(anyhow::anyhow!("poll_interval must be non-zero"));
        }

        if self.management_port == 0 {
            return Err(anyhow::anyhow!("management_port must be non-zero"));
        }

        if self.bind_address.is_empty() {
            return Err(anyhow::anyhow!("bind_address cannot be empty"));
        }

        Ok(())
    }
}

impl ServerConfigBuilder {
    pub fn java_opts<S: ToString, I: IntoIterator<Item = S>>(&mut self, iter: I) -> &mut Self {
        let opts: Vec<String> = iter.into_iter().map(|s| s.to_string()).collect();
        self.java_opts = Some(opts);
        self
    }

    pub fn java_opt<S: ToString>(&mut self, opt: S) -> &mut Self {
        self.java_opts
            .get_or_insert_with(Vec::new)
            .push(opt.to_string());
        self
    }
}

// Default value functions
fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}
fn default_management_port() -> u16 {
    9990
}
fn default_destroy_grace() -> Duration {
    Duration::from_secs(5)
}
fn default_poll_interval() -> Duration {
    Duration::from_millis(500)
}
fn default_startup_timeout() -> Duration {
    Duration::from_secs(60)
}
