//! Registration: decides whether a deployed worker needs to install, and
//! hands control over once it has activated.

use std::sync::Arc;

use super::{ActivationReport, InstallReport, OfflineWorker, WorkerState};
use crate::Error;
use crate::cache::CacheStorage;

/// Result of [`Registration::update`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The store already holds this worker's complete generation.
    Unchanged { current: String },
    /// The worker installed and activated. `previous` is the generation that
    /// was in control before; when set, open pages should reload.
    Activated {
        previous: Option<String>,
        current: String,
        install: InstallReport,
        report: ActivationReport,
    },
}

impl UpdateOutcome {
    pub fn current(&self) -> &str {
        match self {
            UpdateOutcome::Unchanged { current } | UpdateOutcome::Activated { current, .. } => current,
        }
    }

    /// Whether control moved from one generation to another.
    pub fn controller_changed(&self) -> bool {
        matches!(self, UpdateOutcome::Activated { previous: Some(_), .. })
    }
}

/// Tracks the active worker over successive deployments.
pub struct Registration {
    storage: Arc<dyn CacheStorage>,
    active: Option<Arc<OfflineWorker>>,
    controller_changes: usize,
}

impl Registration {
    pub fn new(storage: Arc<dyn CacheStorage>) -> Self {
        Self { storage, active: None, controller_changes: 0 }
    }

    /// The worker currently in control, if any.
    pub fn active(&self) -> Option<&Arc<OfflineWorker>> {
        self.active.as_ref()
    }

    /// How many times control has passed between generations.
    pub fn controller_changes(&self) -> usize {
        self.controller_changes
    }

    /// Bring `worker` into control.
    ///
    /// A worker whose generation is already complete in the store is resumed
    /// without touching the network. Otherwise it installs and activates; if
    /// install fails the previously active worker stays in control.
    ///
    /// # Errors
    ///
    /// Propagates storage errors and the install error.
    pub async fn update(&mut self, worker: OfflineWorker) -> Result<UpdateOutcome, Error> {
        let current = worker.cache_name().to_string();

        if self.is_current(&worker).await? {
            worker.resume().await?;
            tracing::debug!(cache = %current, "cache up to date");
            self.replace(worker);
            return Ok(UpdateOutcome::Unchanged { current });
        }

        let previous = match &self.active {
            Some(active) => Some(active.cache_name().to_string()),
            None => self.storage.keys().await?.into_iter().find(|n| worker.config.version.is_stale(n)),
        };

        let install = worker.install().await?;
        let report = worker.activate().await?;

        if let Some(previous) = &previous {
            self.controller_changes += 1;
            tracing::info!(from = %previous, to = %current, "controller changed");
        }
        self.replace(worker);

        Ok(UpdateOutcome::Activated { previous, current, install, report })
    }

    async fn is_current(&self, worker: &OfflineWorker) -> Result<bool, Error> {
        let owned: Vec<String> = self
            .storage
            .keys()
            .await?
            .into_iter()
            .filter(|n| worker.config.version.owns(n))
            .collect();
        if owned.len() != 1 || owned[0] != worker.cache_name() {
            return Ok(false);
        }

        let cached = self.storage.entries(worker.cache_name()).await?;
        Ok(worker.config.manifest.urls().all(|url| cached.iter().any(|c| c == url.as_str())))
    }

    fn replace(&mut self, worker: OfflineWorker) {
        if let Some(old) = self.active.replace(Arc::new(worker)) {
            old.set_state(WorkerState::Redundant);
        }
    }
}
