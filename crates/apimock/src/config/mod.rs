//! Configuration file for the apimock binary.
//!
//! ```yaml
//! listen:
//!   host: 127.0.0.1
//!   port: 8080
//! log:
//!   json: false
//! mocks:
//!   - name: Users API
//!     basePath: /users-api
//!     operations: [...]
//! ```

mod listen;

use crate::model::MockApiDefinition;
use crate::store::{self, InMemoryStore, StoreError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

pub use listen::{ListenConfig, LogConfig};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub listen: ListenConfig,
    #[serde(default)]
    pub log: LogConfig,
    /// Mock APIs loaded into the store at startup
    #[serde(default)]
    pub mocks: Vec<MockApiDefinition>,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.listen.socket_addr()?;

        for (index, mock) in self.mocks.iter().enumerate() {
            match store::validate(mock) {
                Ok(()) => {}
                Err(StoreError::Validation(errors)) => anyhow::bail!(
                    "Invalid mock #{} ('{}'): {}",
                    index,
                    mock.name,
                    errors.join("; ")
                ),
                Err(e) => anyhow::bail!("Invalid mock #{} ('{}'): {}", index, mock.name, e),
            }
        }

        Ok(())
    }

    /// Load the configured mocks into a store
    pub fn load_mocks(&self, store: &InMemoryStore) -> Result<(), anyhow::Error> {
        for mock in &self.mocks {
            let api = store
                .create(mock.clone())
                .map_err(|e| anyhow::anyhow!("Failed to load mock '{}': {}", mock.name, e))?;
            info!(api_id = %api.id, base_path = %api.base_path, "Loaded mock API from config");
        }
        Ok(())
    }
}
