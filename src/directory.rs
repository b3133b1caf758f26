// directory.rs
use std::sync::{Arc, PoisonError, RwLock};

/// What an agent advertises: its name and the capability it offers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentDescriptor {
    pub name: String,
    pub capability: String,
    pub service: String,
}

impl AgentDescriptor {
    pub fn new(name: &str, capability: &str, service: &str) -> Self {
        Self {
            name: name.to_string(),
            capability: capability.to_string(),
            service: service.to_string(),
        }
    }
}

/// Name/capability lookup shared by every agent of the platform.
#[derive(Debug, Default)]
pub struct DirectoryRegistry {
    entries: RwLock<Vec<AgentDescriptor>>,
}

impl DirectoryRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Registers an agent. Registering a known name replaces its entry in place.
    pub fn register(&self, descriptor: AgentDescriptor) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        match entries.iter_mut().find(|e| e.name == descriptor.name) {
            Some(existing) => *existing = descriptor,
            None => entries.push(descriptor),
        }
    }

    /// Removes an agent. Unknown names are ignored.
    pub fn deregister(&self, name: &str) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|e| e.name != name);
    }

    /// Every agent offering `capability`, in registration order. Empty is a normal answer:
    /// the counterpart may simply not have started yet.
    pub fn lookup(&self, capability: &str) -> Vec<AgentDescriptor> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|e| e.capability == capability)
            .cloned()
            .collect()
    }
}
