use crate::process::ServerProcess;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, info};
use warden_core::{Topology, WardenError};

/// Startup phase reported by the management endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerStatus {
    Starting,
    Running,
    Stopping,
    Failed,
}

impl ServerStatus {
    fn from_value(value: &Value) -> Self {
        match value.as_str().map(str::to_ascii_lowercase).as_deref() {
            Some("running") => ServerStatus::Running,
            Some("stopping") => ServerStatus::Stopping,
            Some("failed") => ServerStatus::Failed,
            // Anything else ("starting", "reload-required", ...) means the
            // instance has not finished coming up.
            _ => ServerStatus::Starting,
        }
    }
}

/// Identifying information about a running container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerDescription {
    pub product_name: Option<String>,
    pub product_version: Option<String>,
    pub release_version: Option<String>,
}

impl std::fmt::Display for ContainerDescription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.product_name, &self.product_version) {
            (Some(name), Some(version)) => write!(f, "{name} {version}"),
            (Some(name), None) => f.write_str(name),
            _ => match &self.release_version {
                Some(release) => write!(f, "Server {release}"),
                None => f.write_str("unknown server"),
            },
        }
    }
}

/// Management operations of one topology.
struct ManagementOps {
    status_attribute: &'static str,
    shutdown_sequence: &'static [&'static str],
}

const STANDALONE_OPS: ManagementOps = ManagementOps {
    status_attribute: "server-state",
    shutdown_sequence: &["shutdown"],
};

const DOMAIN_OPS: ManagementOps = ManagementOps {
    status_attribute: "host-state",
    shutdown_sequence: &["stop-servers", "shutdown"],
};

fn ops_for(topology: Topology) -> &'static ManagementOps {
    match topology {
        Topology::Standalone => &STANDALONE_OPS,
        Topology::Domain => &DOMAIN_OPS,
    }
}

#[derive(Debug, Deserialize)]
struct ManagementResponse {
    outcome: String,
    #[serde(default)]
    result: Option<Value>,
    #[serde(rename = "failure-description", default)]
    failure_description: Option<Value>,
}

/// Client for the managed instance's administrative endpoint.
pub struct AdminClient {
    client: reqwest::Client,
    endpoint: String,
    ops: &'static ManagementOps,
}

impl AdminClient {
    pub fn new(topology: Topology, host: &str, port: u16) -> Result<Self, WardenError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .connect_timeout(Duration::from_secs(1))
            .pool_max_idle_per_host(1)
            .build()
            .map_err(|e| WardenError::management_with_source("failed to build management client", e))?;

        Ok(Self {
            client,
            endpoint: format!("http://{host}:{port}/management"),
            ops: ops_for(topology),
        })
    }

    async fn execute(&self, operation: Value) -> Result<Value, WardenError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&operation)
            .send()
            .await
            .map_err(|e| WardenError::management_with_source("management request failed", e))?;

        let body: ManagementResponse = response
            .json()
            .await
            .map_err(|e| WardenError::management_with_source("malformed management response", e))?;

        if body.outcome == "success" {
            Ok(body.result.unwrap_or(Value::Null))
        } else {
            let failure = body
                .failure_description
                .map(|d| d.to_string())
                .unwrap_or_else(|| format!("outcome was {:?}", body.outcome));
            Err(WardenError::management_with_message(failure))
        }
    }

    /// One status probe against the management endpoint.
    pub async fn probe_status(&self) -> Result<ServerStatus, WardenError> {
        let result = self
            .execute(json!({
                "operation": "read-attribute",
                "name": self.ops.status_attribute,
            }))
            .await?;
        Ok(ServerStatus::from_value(&result))
    }

    /// Single non-blocking liveness probe.
    ///
    /// Connection or protocol failures mean "not up", never an error.
    pub async fn is_running(&self) -> bool {
        matches!(self.probe_status().await, Ok(ServerStatus::Running))
    }

    /// Poll until the instance reports fully started, the process exits, or
    /// `timeout` elapses, whichever comes first.
    pub async fn wait_until_ready(
        &self,
        process: &mut ServerProcess,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<(), WardenError> {
        let wait = async {
            loop {
                if let Ok(Some(status)) = process.try_status() {
                    return Err(WardenError::ProcessDied { status });
                }

                match self.probe_status().await {
                    Ok(ServerStatus::Running) => {
                        info!("Server reported {} running", self.ops.status_attribute);
                        return Ok(());
                    }
                    Ok(status) => debug!("Server not ready yet: {:?}", status),
                    Err(e) => debug!("Readiness probe failed: {}", e),
                }

                tokio::time::sleep(poll_interval).await;
            }
        };

        match tokio::time::timeout(timeout, wait).await {
            Ok(result) => result,
            Err(_) => Err(WardenError::StartupTimeout { timeout }),
        }
    }

    /// Order a graceful shutdown over the management protocol.
    pub async fn shutdown(&self) -> Result<(), WardenError> {
        for op in self.ops.shutdown_sequence {
            let request = json!({ "operation": op });
            let response = self
                .client
                .post(&self.endpoint)
                .json(&request)
                .send()
                .await
                .map_err(WardenError::shutdown_unreachable)?;

            // The server may drop the connection mid-response while going
            // down; an unreadable body after a delivered request counts as
            // an acknowledgement.
            if let Ok(body) = response.json::<ManagementResponse>().await {
                if body.outcome != "success" {
                    let failure = body
                        .failure_description
                        .map(|d| d.to_string())
                        .unwrap_or_else(|| format!("outcome was {:?}", body.outcome));
                    return Err(WardenError::shutdown_unreachable(
                        WardenError::management_with_message(failure),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Query product and version metadata from the running instance.
    pub async fn describe(&self) -> Result<ContainerDescription, WardenError> {
        let result = self
            .execute(json!({
                "operation": "read-resource",
                "include-runtime": true,
            }))
            .await?;

        let attribute =
            |name: &str| result.get(name).and_then(Value::as_str).map(str::to_string);

        Ok(ContainerDescription {
            product_name: attribute("product-name"),
            product_version: attribute("product-version"),
            release_version: attribute("release-version"),
        })
    }
}
