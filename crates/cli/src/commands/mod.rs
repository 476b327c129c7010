//! Subcommand implementations.
//!
//! Each command returns a serializable output struct; `main` prints it as
//! pretty JSON.

pub mod cache;
pub mod fetch;
pub mod update;

use std::sync::Arc;

use hubcache_core::{AppConfig, CacheStorage, ClientRegistry, Error, Network, OfflineWorker};

/// Everything a command needs: config plus the injected backends.
pub struct Context {
    pub config: AppConfig,
    pub storage: Arc<dyn CacheStorage>,
    pub network: Arc<dyn Network>,
    pub clients: Arc<ClientRegistry>,
}

impl Context {
    /// A fresh worker for the configured version.
    pub fn worker(&self) -> Result<OfflineWorker, Error> {
        let config = self.config.worker_config().map_err(|e| Error::InvalidInput(e.to_string()))?;
        Ok(OfflineWorker::new(config, self.storage.clone(), self.network.clone(), self.clients.clone()))
    }
}
