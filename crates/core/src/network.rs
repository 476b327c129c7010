//! Network boundary used by install and fetch interception.

use crate::Error;
use crate::request::{Request, Response};

/// Performs real network fetches.
///
/// An `Err` means the request never produced a response (offline, DNS,
/// refused, timeout). HTTP error statuses come back as `Ok` responses.
#[async_trait::async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response, Error>;
}

#[async_trait::async_trait]
impl<N: Network + ?Sized> Network for std::sync::Arc<N> {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        (**self).fetch(request).await
    }
}
