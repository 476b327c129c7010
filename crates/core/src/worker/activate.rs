//! Activate phase: prune stale generations and claim open pages.

use futures_util::future::join_all;

use super::{OfflineWorker, WorkerState};
use crate::Error;

/// Outcome of activation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivationReport {
    pub cache_name: String,
    /// Stale generations removed.
    pub deleted: Vec<String>,
    /// Stale generations that could not be removed, with the reason.
    pub failed: Vec<(String, String)>,
    pub clients_claimed: usize,
}

impl OfflineWorker {
    /// Run the activate phase.
    ///
    /// Deletes every generation in this worker's namespace except its own.
    /// Deletions run concurrently; one failing never stops the others.
    /// Generations outside the namespace are left alone.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidState` unless the worker is `Installed`.
    pub async fn activate(&self) -> Result<ActivationReport, Error> {
        self.transition(WorkerState::Installed, WorkerState::Activating)?;
        let cache_name = self.cache_name().to_string();

        let names = match self.storage.keys().await {
            Ok(names) => names,
            Err(e) => {
                tracing::warn!(error = %e, "could not list caches; skipping cleanup");
                Vec::new()
            }
        };

        let stale: Vec<String> = names.into_iter().filter(|n| self.config.version.is_stale(n)).collect();
        let results = join_all(stale.iter().map(|name| self.storage.delete(name))).await;

        let mut report = ActivationReport { cache_name, ..Default::default() };
        for (name, result) in stale.into_iter().zip(results) {
            match result {
                Ok(_) => {
                    tracing::debug!(cache = %name, "deleted stale cache");
                    report.deleted.push(name);
                }
                Err(e) => {
                    tracing::warn!(cache = %name, error = %e, "failed to delete stale cache");
                    report.failed.push((name, e.to_string()));
                }
            }
        }

        report.clients_claimed = self.controller.claim_clients().await;
        self.set_state(WorkerState::Activated);

        tracing::info!(
            cache = %report.cache_name,
            deleted = report.deleted.len(),
            failed = report.failed.len(),
            clients = report.clients_claimed,
            "activated"
        );

        Ok(report)
    }
}
