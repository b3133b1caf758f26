// config.rs

use crate::error::ConfigError;
use crate::product::{default_catalog, Product};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::time::Duration;

/// Represents the full configuration of the platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logical names of the three agents.
    pub agents: AgentNames,

    /// Where the inventory persists its catalog. `None` keeps it in memory.
    pub catalog_path: Option<String>,

    /// Catalog used when no persisted one can be loaded.
    pub initial_catalog: Vec<Product>,

    /// Longest time an idle agent stays parked before re-running its behaviours.
    pub tick_ms: u64,

    /// Delay between two supplier lookups while the inventory has not found one.
    pub discovery_retry_ms: u64,

    /// Simulated supplier fulfilment latency.
    pub restock_delay_ms: u64,

    /// Pause between starting supplier, inventory and buyer.
    pub startup_stagger_ms: u64,

    /// Give up on a purchase reply after this long. `None` waits forever.
    pub purchase_timeout_ms: Option<u64>,

    /// Debug mode flag (echoes agent logs to the console).
    pub debug: bool,
}

/// Defines the names the agents register and address each other by.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentNames {
    pub buyer: String,
    pub inventory: String,
    pub supplier: String,
}

impl Default for AgentNames {
    fn default() -> Self {
        Self {
            buyer: "BuyerAgent".to_string(),
            inventory: "InventoryAgent".to_string(),
            supplier: "SupplierAgent".to_string(),
        }
    }
}

impl Default for Config {
    /// Returns a default configuration for the platform.
    fn default() -> Self {
        Self {
            agents: AgentNames::default(),
            catalog_path: Some("inventory.json".to_string()),
            initial_catalog: default_catalog(),
            tick_ms: 50,
            discovery_retry_ms: 2000,
            restock_delay_ms: 1000,
            startup_stagger_ms: 500,
            purchase_timeout_ms: None,
            debug: true,
        }
    }
}

impl Config {
    /// Loads a configuration from a JSON file. Missing fields take their default value.
    ///
    /// # Arguments
    /// * `path` - The file path to load the configuration from.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        let config: Config = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// Saves the current configuration to a JSON file.
    ///
    /// # Arguments
    /// * `path` - The file path to save the configuration to.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }

    pub fn discovery_retry(&self) -> Duration {
        Duration::from_millis(self.discovery_retry_ms)
    }

    pub fn restock_delay(&self) -> Duration {
        Duration::from_millis(self.restock_delay_ms)
    }

    pub fn startup_stagger(&self) -> Duration {
        Duration::from_millis(self.startup_stagger_ms)
    }

    pub fn purchase_timeout(&self) -> Option<Duration> {
        self.purchase_timeout_ms.map(Duration::from_millis)
    }
}
