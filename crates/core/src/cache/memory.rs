//! In-memory cache storage.
//!
//! Uses a HashMap behind a tokio RwLock for concurrent access. An optional
//! byte quota makes writes fail the way a full browser store does.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::hash::{request_key, request_url};
use super::storage::CacheStorage;
use crate::Error;
use crate::request::{Request, Response};

struct StoredEntry {
    url: String,
    response: Response,
}

#[derive(Default)]
struct Generation {
    index: HashMap<String, usize>,
    entries: Vec<StoredEntry>,
}

impl Generation {
    fn size(&self) -> usize {
        self.entries.iter().map(|e| e.response.size()).sum()
    }

    fn insert(&mut self, key: String, entry: StoredEntry) {
        match self.index.get(&key) {
            Some(&i) => self.entries[i] = entry,
            None => {
                self.index.insert(key, self.entries.len());
                self.entries.push(entry);
            }
        }
    }

    fn existing_size(&self, key: &str) -> usize {
        self.index.get(key).map(|&i| self.entries[i].response.size()).unwrap_or(0)
    }
}

#[derive(Default)]
struct Inner {
    order: Vec<String>,
    caches: HashMap<String, Generation>,
}

impl Inner {
    fn used_bytes(&self) -> usize {
        self.caches.values().map(Generation::size).sum()
    }

    fn open(&mut self, name: &str) -> &mut Generation {
        if !self.caches.contains_key(name) {
            self.order.push(name.to_string());
        }
        self.caches.entry(name.to_string()).or_default()
    }
}

/// Cache storage held entirely in process memory.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<RwLock<Inner>>,
    quota_bytes: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage that rejects writes once `quota_bytes` would be exceeded.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self { inner: Arc::default(), quota_bytes: Some(quota_bytes) }
    }

    /// Total stored bytes across all generations.
    pub async fn used_bytes(&self) -> usize {
        self.inner.read().await.used_bytes()
    }

    fn check_quota(&self, inner: &Inner, name: &str, batch: &[(String, usize)]) -> Result<(), Error> {
        let Some(quota) = self.quota_bytes else {
            return Ok(());
        };

        let current = inner.used_bytes();
        let generation = inner.caches.get(name);
        let mut pending: HashMap<&str, usize> = HashMap::new();
        for (key, size) in batch {
            pending.insert(key.as_str(), *size);
        }
        let replaced: usize = pending
            .keys()
            .map(|key| generation.map(|g| g.existing_size(key)).unwrap_or(0))
            .sum();
        let added: usize = pending.values().sum();

        let projected = current - replaced + added;
        if projected > quota {
            return Err(Error::QuotaExceeded(format!("{projected} bytes exceeds quota of {quota}")));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl CacheStorage for MemoryStorage {
    async fn open(&self, name: &str) -> Result<(), Error> {
        self.inner.write().await.open(name);
        Ok(())
    }

    async fn has(&self, name: &str) -> Result<bool, Error> {
        Ok(self.inner.read().await.caches.contains_key(name))
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        Ok(self.inner.read().await.order.clone())
    }

    async fn delete(&self, name: &str) -> Result<bool, Error> {
        let mut inner = self.inner.write().await;
        let existed = inner.caches.remove(name).is_some();
        inner.order.retain(|n| n != name);
        Ok(existed)
    }

    async fn match_request(&self, name: &str, request: &Request) -> Result<Option<Response>, Error> {
        let key = request_key(request);
        let inner = self.inner.read().await;
        let found = inner
            .caches
            .get(name)
            .and_then(|g| g.index.get(&key).map(|&i| g.entries[i].response.clone()));
        Ok(found)
    }

    async fn put(&self, name: &str, request: &Request, response: &Response) -> Result<(), Error> {
        self.put_all(name, &[(request.clone(), response.clone())]).await
    }

    async fn put_all(&self, name: &str, entries: &[(Request, Response)]) -> Result<(), Error> {
        let keyed: Vec<(String, usize)> = entries
            .iter()
            .map(|(req, res)| (request_key(req), res.size()))
            .collect();

        let mut inner = self.inner.write().await;
        self.check_quota(&inner, name, &keyed)?;

        let generation = inner.open(name);
        for ((key, _), (req, res)) in keyed.into_iter().zip(entries) {
            generation.insert(key, StoredEntry { url: request_url(req), response: res.clone() });
        }
        Ok(())
    }

    async fn entries(&self, name: &str) -> Result<Vec<String>, Error> {
        let inner = self.inner.read().await;
        let generation = inner.caches.get(name).ok_or_else(|| Error::CacheMiss(name.to_string()))?;
        Ok(generation.entries.iter().map(|e| e.url.clone()).collect())
    }
}
