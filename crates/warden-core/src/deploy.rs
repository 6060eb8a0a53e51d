use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::RwLock;

const DEFAULT_SLOT: &str = "main";

/// Identifies a module by name and slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleRef {
    name: String,
    slot: String,
}

impl ModuleRef {
    /// A reference into the default (`main`) slot.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slot: DEFAULT_SLOT.to_string(),
        }
    }

    pub fn with_slot(name: impl Into<String>, slot: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slot: slot.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn slot(&self) -> &str {
        &self.slot
    }
}

impl fmt::Display for ModuleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.slot == DEFAULT_SLOT {
            f.write_str(&self.name)
        } else {
            write!(f, "{}:{}", self.name, self.slot)
        }
    }
}

/// Whether a dependency is injected into or withheld from a deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DependencyKind {
    Include,
    Exclude,
}

/// One module-dependency entry applied at deployment time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentDependency {
    pub module: ModuleRef,
    pub kind: DependencyKind,
    pub import_services: bool,
    pub optional: bool,
}

impl DeploymentDependency {
    pub fn include(module: ModuleRef, import_services: bool, optional: bool) -> Self {
        Self {
            module,
            kind: DependencyKind::Include,
            import_services,
            optional,
        }
    }

    pub fn exclude(module: ModuleRef) -> Self {
        Self {
            module,
            kind: DependencyKind::Exclude,
            import_services: false,
            optional: false,
        }
    }
}

/// Insertion-ordered set of deployment dependencies, keyed by module.
///
/// Re-adding a module replaces its entry in place; removal frees the
/// position. Readers always observe a complete snapshot, and a mutation is
/// visible to the next read (last writer wins, no transactional coupling).
#[derive(Debug, Default)]
pub struct DependencyStore {
    entries: RwLock<Vec<DeploymentDependency>>,
}

impl DependencyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a module to inject; returns the entry it displaced, if any.
    pub fn add_include(
        &self,
        module: ModuleRef,
        import_services: bool,
        optional: bool,
    ) -> Option<DeploymentDependency> {
        self.put(DeploymentDependency::include(
            module,
            import_services,
            optional,
        ))
    }

    /// Record a module to withhold; returns the entry it displaced, if any.
    pub fn add_exclude(&self, module: ModuleRef) -> Option<DeploymentDependency> {
        self.put(DeploymentDependency::exclude(module))
    }

    /// Remove the entry for `module`, returning it if present.
    pub fn remove(&self, module: &ModuleRef) -> Option<DeploymentDependency> {
        let mut entries = self.entries.write().unwrap();
        let position = entries.iter().position(|e| &e.module == module)?;
        Some(entries.remove(position))
    }

    /// Snapshot of the current dependencies in insertion order.
    pub fn current(&self) -> Vec<DeploymentDependency> {
        self.entries.read().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().unwrap().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().unwrap().clear();
    }

    fn put(&self, entry: DeploymentDependency) -> Option<DeploymentDependency> {
        let mut entries = self.entries.write().unwrap();
        match entries.iter().position(|e| e.module == entry.module) {
            // A re-added module keeps its original position.
            Some(position) => Some(std::mem::replace(&mut entries[position], entry)),
            None => {
                entries.push(entry);
                None
            }
        }
    }
}
