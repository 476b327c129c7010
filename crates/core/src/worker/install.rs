//! Install phase: pre-cache the manifest.
//!
//! Every manifest entry is fetched concurrently. Only when all of them came
//! back with a success status is the batch written, in one atomic `put_all`.
//! Any failure fails the whole install; a generation created by the failed
//! attempt is removed again so no partial cache survives.

use futures_util::future::try_join_all;

use super::{OfflineWorker, WorkerState};
use crate::Error;
use crate::request::{Request, Response};

/// Outcome of a successful install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub cache_name: String,
    /// Entries written (one per manifest entry).
    pub entries: usize,
    /// Whether skip-waiting was signalled to the controller.
    pub skip_waiting: bool,
}

impl OfflineWorker {
    /// Run the install phase.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidState` unless the worker is `Parsed`, and
    /// `Error::InstallFailed` (or the storage error) if any entry could not be
    /// fetched or stored. A failed worker becomes `Redundant`; retry with a new
    /// worker.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        self.transition(WorkerState::Parsed, WorkerState::Installing)?;
        let cache_name = self.cache_name().to_string();
        tracing::info!(cache = %cache_name, entries = self.config.manifest.entries().len(), "installing");

        match self.precache(&cache_name).await {
            Ok(entries) => {
                self.set_state(WorkerState::Installed);
                self.controller.skip_waiting().await;
                tracing::info!(cache = %cache_name, entries, "installed");
                Ok(InstallReport { cache_name, entries, skip_waiting: true })
            }
            Err(e) => {
                self.set_state(WorkerState::Redundant);
                tracing::warn!(cache = %cache_name, error = %e, "install failed");
                Err(e)
            }
        }
    }

    async fn precache(&self, cache_name: &str) -> Result<usize, Error> {
        let existed = self.storage.has(cache_name).await?;
        self.storage.open(cache_name).await?;

        let result = self.fetch_manifest().await;
        let result = match result {
            Ok(batch) => self.storage.put_all(cache_name, &batch).await.map(|()| batch.len()),
            Err(e) => Err(e),
        };

        if result.is_err()
            && !existed
            && let Err(e) = self.storage.delete(cache_name).await
        {
            tracing::warn!(cache = %cache_name, error = %e, "failed to remove partial generation");
        }

        result
    }

    async fn fetch_manifest(&self) -> Result<Vec<(Request, Response)>, Error> {
        let fetches = self.config.manifest.entries().iter().map(|entry| async move {
            let request = Request::get(entry.url.clone());
            let response = match self.network.fetch(&request).await {
                Ok(response) => response,
                Err(e) => return Err(Error::InstallFailed(format!("{}: {e}", entry.path))),
            };

            if !response.is_ok() {
                return Err(Error::InstallFailed(format!("{}: status {}", entry.path, response.status.as_u16())));
            }

            Ok((request, response))
        });

        try_join_all(fetches).await
    }
}
