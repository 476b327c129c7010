//! `hubcache update`: install and activate the configured version.

use hubcache_core::{Error, Registration, UpdateOutcome};
use serde::Serialize;

use super::Context;

/// A stale generation that could not be removed.
#[derive(Debug, Clone, Serialize)]
pub struct FailedDelete {
    pub cache_name: String,
    pub error: String,
}

/// Output from the update command.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateOutput {
    /// `unchanged` or `activated`.
    pub status: &'static str,
    pub cache_name: String,
    pub previous: Option<String>,
    /// Open pages should reload.
    pub controller_changed: bool,
    pub entries: usize,
    pub deleted: Vec<String>,
    pub failed: Vec<FailedDelete>,
    pub clients_claimed: usize,
}

/// Implementation of the update command.
pub async fn update_impl(ctx: &Context) -> Result<UpdateOutput, Error> {
    let worker = ctx.worker()?;
    let mut registration = Registration::new(ctx.storage.clone());
    let outcome = registration.update(worker).await?;
    let controller_changed = outcome.controller_changed();

    let output = match outcome {
        UpdateOutcome::Unchanged { current } => {
            let entries = ctx.storage.entries(&current).await?.len();
            UpdateOutput {
                status: "unchanged",
                cache_name: current,
                previous: None,
                controller_changed,
                entries,
                deleted: Vec::new(),
                failed: Vec::new(),
                clients_claimed: 0,
            }
        }
        UpdateOutcome::Activated { previous, current, install, report } => UpdateOutput {
            status: "activated",
            cache_name: current,
            previous,
            controller_changed,
            entries: install.entries,
            deleted: report.deleted,
            failed: report
                .failed
                .into_iter()
                .map(|(cache_name, error)| FailedDelete { cache_name, error })
                .collect(),
            clients_claimed: report.clients_claimed,
        },
    };

    Ok(output)
}
