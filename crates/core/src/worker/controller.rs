//! Lifecycle controller: the host side of skip-waiting and client claiming.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Signals a worker sends to the environment hosting it.
#[async_trait::async_trait]
pub trait LifecycleController: Send + Sync {
    /// Let the installed worker activate without waiting for open pages to close.
    async fn skip_waiting(&self);

    /// Take control of every open page. Returns how many were claimed.
    async fn claim_clients(&self) -> usize;
}

#[derive(Debug, Default)]
struct ClientCounts {
    open: usize,
    controlled: usize,
}

/// Tracks open pages and the signals received from the worker.
///
/// Both counts sit behind one lock so `controlled <= open` holds under
/// concurrent connect, disconnect and claim.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    counts: Mutex<ClientCounts>,
    skip_waiting: AtomicBool,
}

impl ClientRegistry {
    pub fn new(open_clients: usize) -> Self {
        Self { counts: Mutex::new(ClientCounts { open: open_clients, controlled: 0 }), ..Default::default() }
    }

    fn counts(&self) -> MutexGuard<'_, ClientCounts> {
        self.counts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A page was opened.
    pub fn connect(&self) {
        self.counts().open += 1;
    }

    /// A page was closed.
    pub fn disconnect(&self) {
        let mut counts = self.counts();
        counts.open = counts.open.saturating_sub(1);
        counts.controlled = counts.controlled.min(counts.open);
    }

    pub fn open_clients(&self) -> usize {
        self.counts().open
    }

    /// Pages currently served by the active worker.
    pub fn controlled_clients(&self) -> usize {
        self.counts().controlled
    }

    pub fn skip_waiting_requested(&self) -> bool {
        self.skip_waiting.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl LifecycleController for ClientRegistry {
    async fn skip_waiting(&self) {
        self.skip_waiting.store(true, Ordering::SeqCst);
    }

    async fn claim_clients(&self) -> usize {
        let mut counts = self.counts();
        counts.controlled = counts.open;
        counts.controlled
    }
}
