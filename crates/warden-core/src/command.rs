use crate::{ServerConfig, Topology, WardenError};
use std::path::{Path, PathBuf};

/// File every recognized server installation carries at its root.
pub const MODULE_LAUNCHER_JAR: &str = "jboss-modules.jar";

const STANDALONE_BOOT_MODULE: &str = "org.jboss.as.standalone";
const DOMAIN_BOOT_MODULE: &str = "org.jboss.as.host-controller";

/// Argument vector and environment for launching one server topology.
///
/// Immutable once built; construction is pure apart from the marker-file
/// existence check on the installation root.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandSpec {
    program: PathBuf,
    argv: Vec<String>,
    env: Vec<(String, String)>,
    home: PathBuf,
}

impl CommandSpec {
    /// Build the launch command for `config`.
    ///
    /// Fails with [`WardenError::InvalidHome`] when the installation root
    /// does not carry the module launcher jar.
    pub fn for_config(config: &ServerConfig) -> Result<Self, WardenError> {
        let home = &config.home;
        let launcher = home.join(MODULE_LAUNCHER_JAR);
        if !launcher.exists() {
            return Err(WardenError::InvalidHome { home: home.clone() });
        }

        let program = match &config.java_home {
            Some(java_home) => java_home.join("bin").join("java"),
            None => PathBuf::from("java"),
        };

        let management = config.management_host().to_string();

        let mut argv = Vec::new();
        argv.extend(config.java_opts.iter().cloned());
        argv.push(format!("-Djboss.home.dir={}", home.display()));
        // Keep color escapes out of the captured console stream.
        argv.push("-Dorg.jboss.logmanager.nocolor=true".to_string());
        argv.push("-jar".to_string());
        argv.push(launcher.display().to_string());
        argv.push("-mp".to_string());
        argv.push(home.join("modules").display().to_string());
        argv.push(boot_module(config.topology).to_string());
        argv.push(format!("-b={}", config.bind_address));
        argv.push(format!("-bmanagement={management}"));

        let env = vec![("JBOSS_HOME".to_string(), home.display().to_string())];

        Ok(Self {
            program,
            argv,
            env,
            home: home.clone(),
        })
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    pub fn env(&self) -> &[(String, String)] {
        &self.env
    }

    pub fn home(&self) -> &Path {
        &self.home
    }
}

fn boot_module(topology: Topology) -> &'static str {
    match topology {
        Topology::Standalone => STANDALONE_BOOT_MODULE,
        Topology::Domain => DOMAIN_BOOT_MODULE,
    }
}
