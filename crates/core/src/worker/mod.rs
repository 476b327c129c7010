//! Offline worker lifecycle.
//!
//! A worker moves through explicit phases instead of event callbacks:
//!
//! - [`OfflineWorker::install`]: pre-cache the manifest into the current
//!   generation, then ask the controller to skip waiting
//! - [`OfflineWorker::activate`]: prune stale generations, claim clients
//! - [`OfflineWorker::handle_fetch`]: cache-first interception with
//!   write-through and offline fallback
//!
//! [`Registration`] drives the phases when a new version is deployed.

mod activate;
mod controller;
mod install;
mod intercept;
mod registration;
mod state;

use std::sync::Arc;

use tokio::sync::watch;

use crate::Error;
use crate::cache::CacheStorage;
use crate::manifest::Manifest;
use crate::network::Network;
use crate::scope::Scope;
use crate::version::CacheVersion;

pub use activate::ActivationReport;
pub use controller::{ClientRegistry, LifecycleController};
pub use install::InstallReport;
pub use intercept::{FetchOutcome, PassthroughReason, ResponseSource};
pub use registration::{Registration, UpdateOutcome};
pub use state::WorkerState;

/// Resolved inputs of one deployed worker version.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub scope: Scope,
    pub version: CacheVersion,
    pub manifest: Manifest,
    /// Hosts of the external auth/content API.
    pub api_hosts: Vec<String>,
}

/// Whether `host` is one of `api_hosts` or a subdomain of one.
pub fn matches_api_host(host: &str, api_hosts: &[String]) -> bool {
    let host = host.to_ascii_lowercase();
    api_hosts.iter().any(|api| {
        let api = api.to_ascii_lowercase();
        host == api || host.ends_with(&format!(".{api}"))
    })
}

/// One deployed version of the offline cache worker.
pub struct OfflineWorker {
    config: WorkerConfig,
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
    controller: Arc<dyn LifecycleController>,
    state: watch::Sender<WorkerState>,
}

impl OfflineWorker {
    pub fn new(
        config: WorkerConfig, storage: Arc<dyn CacheStorage>, network: Arc<dyn Network>,
        controller: Arc<dyn LifecycleController>,
    ) -> Self {
        let (state, _) = watch::channel(WorkerState::Parsed);
        Self { config, storage, network, controller, state }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Name of the cache generation this worker owns.
    pub fn cache_name(&self) -> &str {
        self.config.version.cache_name()
    }

    pub fn state(&self) -> WorkerState {
        *self.state.borrow()
    }

    /// Adopt a generation that an earlier process already installed and
    /// activated, moving straight to `Activated`.
    ///
    /// # Errors
    ///
    /// Returns `Error::CacheMiss` if the generation is not in the store, and
    /// `Error::InvalidState` if this worker already left `Parsed`.
    pub async fn resume(&self) -> Result<(), Error> {
        if !self.storage.has(self.cache_name()).await? {
            return Err(Error::CacheMiss(self.cache_name().to_string()));
        }
        self.transition(WorkerState::Parsed, WorkerState::Activated)?;
        tracing::debug!(cache = self.cache_name(), "resumed activated worker");
        Ok(())
    }

    /// Move from `from` to `to`, failing if the worker is elsewhere.
    fn transition(&self, from: WorkerState, to: WorkerState) -> Result<(), Error> {
        let mut current = from;
        let moved = self.state.send_if_modified(|state| {
            current = *state;
            if *state == from {
                *state = to;
                true
            } else {
                false
            }
        });

        if moved {
            Ok(())
        } else {
            Err(Error::InvalidState(format!("cannot move from {current} to {to}")))
        }
    }

    fn set_state(&self, to: WorkerState) {
        self.state.send_replace(to);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted network shared by the worker tests.

    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use http::StatusCode;

    use super::*;
    use crate::cache::MemoryStorage;
    use crate::request::{Request, Response};

    #[derive(Default)]
    pub struct ScriptedNetwork {
        routes: Mutex<HashMap<String, Response>>,
        failures: Mutex<HashMap<String, fn(String) -> Error>>,
        offline: AtomicBool,
        calls: AtomicUsize,
    }

    impl ScriptedNetwork {
        pub fn serve(&self, url: &str, status: StatusCode, body: impl Into<bytes::Bytes>) {
            let response = Response::new(status, body).with_header("content-type", "text/plain");
            self.routes.lock().unwrap().insert(url.to_string(), response);
        }

        /// Answer `url` with the error built by `error`, e.g. `Error::FetchTooLarge`.
        pub fn fail(&self, url: &str, error: fn(String) -> Error) {
            self.failures.lock().unwrap().insert(url.to_string(), error);
        }

        pub fn set_offline(&self, offline: bool) {
            self.offline.store(offline, Ordering::SeqCst);
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl Network for ScriptedNetwork {
        async fn fetch(&self, request: &Request) -> Result<Response, Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.offline.load(Ordering::SeqCst) {
                return Err(Error::Network("offline".into()));
            }
            if let Some(error) = self.failures.lock().unwrap().get(request.url.as_str()) {
                return Err(error(request.url.to_string()));
            }
            let routes = self.routes.lock().unwrap();
            Ok(routes
                .get(request.url.as_str())
                .cloned()
                .unwrap_or_else(|| Response::new(StatusCode::NOT_FOUND, "not found")))
        }
    }

    pub const SCOPE: &str = "https://hub.example/";

    pub fn worker_config(prefix: &str, version: &str, paths: &[&str], offline_page: &str) -> WorkerConfig {
        let scope = Scope::parse(SCOPE).unwrap();
        WorkerConfig {
            manifest: Manifest::new(&scope, paths, offline_page).unwrap(),
            version: CacheVersion::new(prefix, version).unwrap(),
            scope,
            api_hosts: vec!["workers.dev".into()],
        }
    }

    /// Network serving every manifest path of `config` with body `path`.
    pub fn network_for(config: &WorkerConfig) -> Arc<ScriptedNetwork> {
        let network = Arc::new(ScriptedNetwork::default());
        for entry in config.manifest.entries() {
            network.serve(entry.url.as_str(), StatusCode::OK, entry.path.clone());
        }
        network
    }

    pub struct Harness {
        pub storage: Arc<MemoryStorage>,
        pub network: Arc<ScriptedNetwork>,
        pub clients: Arc<ClientRegistry>,
    }

    impl Harness {
        pub fn new(config: &WorkerConfig) -> Self {
            Self {
                storage: Arc::new(MemoryStorage::new()),
                network: network_for(config),
                clients: Arc::new(ClientRegistry::new(1)),
            }
        }

        pub fn worker(&self, config: WorkerConfig) -> OfflineWorker {
            OfflineWorker::new(config, self.storage.clone(), self.network.clone(), self.clients.clone())
        }
    }
}
