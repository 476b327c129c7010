//! Storage trait shared by the in-memory and SQLite backends.

use std::sync::Arc;

use crate::Error;
use crate::request::{Request, Response};

/// A store of named cache generations.
///
/// Writes replace whole entries; a reader never observes a half-written
/// response. Keys within a generation are unique and a second `put` for the
/// same request overwrites the first.
#[async_trait::async_trait]
pub trait CacheStorage: Send + Sync {
    /// Create the generation if it does not exist yet.
    async fn open(&self, name: &str) -> Result<(), Error>;

    async fn has(&self, name: &str) -> Result<bool, Error>;

    /// Generation names in creation order.
    async fn keys(&self) -> Result<Vec<String>, Error>;

    /// Delete a generation and all its entries.
    /// Returns true if it existed.
    async fn delete(&self, name: &str) -> Result<bool, Error>;

    /// Look up a request in one generation. A missing generation is a miss.
    async fn match_request(&self, name: &str, request: &Request) -> Result<Option<Response>, Error>;

    /// Store one entry, creating the generation if needed.
    async fn put(&self, name: &str, request: &Request, response: &Response) -> Result<(), Error>;

    /// Store a batch of entries atomically: either all land or none do.
    async fn put_all(&self, name: &str, entries: &[(Request, Response)]) -> Result<(), Error>;

    /// Request URLs stored in a generation, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `Error::CacheMiss` if the generation does not exist.
    async fn entries(&self, name: &str) -> Result<Vec<String>, Error>;
}

#[async_trait::async_trait]
impl<S: CacheStorage + ?Sized> CacheStorage for Arc<S> {
    async fn open(&self, name: &str) -> Result<(), Error> {
        (**self).open(name).await
    }

    async fn has(&self, name: &str) -> Result<bool, Error> {
        (**self).has(name).await
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        (**self).keys().await
    }

    async fn delete(&self, name: &str) -> Result<bool, Error> {
        (**self).delete(name).await
    }

    async fn match_request(&self, name: &str, request: &Request) -> Result<Option<Response>, Error> {
        (**self).match_request(name, request).await
    }

    async fn put(&self, name: &str, request: &Request, response: &Response) -> Result<(), Error> {
        (**self).put(name, request, response).await
    }

    async fn put_all(&self, name: &str, entries: &[(Request, Response)]) -> Result<(), Error> {
        (**self).put_all(name, entries).await
    }

    async fn entries(&self, name: &str) -> Result<Vec<String>, Error> {
        (**self).entries(name).await
    }
}
