//! Fetch interception.
//!
//! ### Policy, in order
//! 1. Worker not activated: pass through.
//! 2. External API host: pass through, never cached (any method).
//! 3. Non-GET: pass through.
//! 4. Cache hit in the active generation: serve it, no network.
//! 5. Miss: fetch. Same-origin 2xx responses are written through to the
//!    cache before being returned; a failed write is logged and ignored.
//! 6. Network failure: navigations get the offline page, everything else an
//!    empty 408 response. Interception never returns an error.
//!
//! A network error that is not a connectivity failure (the server answered
//! but the body exceeded the size limit) is passed through instead.

use http::Method;
use serde::Serialize;

use super::{OfflineWorker, matches_api_host};
use crate::Error;
use crate::request::{Request, Response};

/// Why a request was left to the page's own network stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PassthroughReason {
    /// The worker is not activated.
    NotControlling,
    /// Request targets the external auth/content API.
    ApiHost,
    /// Only GET requests are handled.
    NonGetMethod,
    /// The response was over the size limit; not cached.
    TooLarge,
    /// The network backend refused the request for another reason.
    Unfetchable,
}

/// Where an intercepted response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    Cache,
    Network,
    OfflineFallback,
    Failed,
}

/// Result of offering a request to the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Passthrough(PassthroughReason),
    Respond { response: Response, source: ResponseSource },
}

impl FetchOutcome {
    fn respond(response: Response, source: ResponseSource) -> Self {
        FetchOutcome::Respond { response, source }
    }

    pub fn response(&self) -> Option<&Response> {
        match self {
            FetchOutcome::Respond { response, .. } => Some(response),
            FetchOutcome::Passthrough(_) => None,
        }
    }

    pub fn source(&self) -> Option<ResponseSource> {
        match self {
            FetchOutcome::Respond { source, .. } => Some(*source),
            FetchOutcome::Passthrough(_) => None,
        }
    }

    pub fn is_passthrough(&self) -> bool {
        matches!(self, FetchOutcome::Passthrough(_))
    }
}

impl OfflineWorker {
    /// Offer one outgoing request to the worker.
    pub async fn handle_fetch(&self, request: &Request) -> FetchOutcome {
        if !self.state().is_controlling() {
            return FetchOutcome::Passthrough(PassthroughReason::NotControlling);
        }

        if let Some(host) = request.host()
            && matches_api_host(host, &self.config.api_hosts)
        {
            return FetchOutcome::Passthrough(PassthroughReason::ApiHost);
        }

        if request.method != Method::GET {
            return FetchOutcome::Passthrough(PassthroughReason::NonGetMethod);
        }

        let cache_name = self.cache_name();
        match self.storage.match_request(cache_name, request).await {
            Ok(Some(cached)) => {
                tracing::debug!(url = %request.url, "cache hit");
                return FetchOutcome::respond(cached, ResponseSource::Cache);
            }
            Ok(None) => tracing::debug!(url = %request.url, "cache miss"),
            Err(e) => tracing::warn!(url = %request.url, error = %e, "cache lookup failed; treating as miss"),
        }

        match self.network.fetch(request).await {
            Ok(response) => {
                if response.is_ok() && self.config.scope.is_same_origin(&request.url) {
                    self.write_through(request, &response).await;
                }
                FetchOutcome::respond(response, ResponseSource::Network)
            }
            Err(e) if e.is_network() => {
                tracing::debug!(url = %request.url, error = %e, "network failed");
                self.offline_response(request).await
            }
            Err(Error::FetchTooLarge(reason)) => {
                tracing::debug!(url = %request.url, %reason, "response too large to cache");
                FetchOutcome::Passthrough(PassthroughReason::TooLarge)
            }
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "network rejected request");
                FetchOutcome::Passthrough(PassthroughReason::Unfetchable)
            }
        }
    }

    async fn write_through(&self, request: &Request, response: &Response) {
        if let Err(e) = self.storage.put(self.cache_name(), request, response).await {
            tracing::warn!(url = %request.url, error = %e, "cache write failed; serving network response");
        }
    }

    async fn offline_response(&self, request: &Request) -> FetchOutcome {
        if !request.is_navigation() {
            return FetchOutcome::respond(Response::offline_failure(), ResponseSource::Failed);
        }

        let offline = Request::get(self.config.manifest.offline_page().clone());
        match self.storage.match_request(self.cache_name(), &offline).await {
            Ok(Some(page)) => FetchOutcome::respond(page, ResponseSource::OfflineFallback),
            Ok(None) => {
                tracing::warn!("offline page missing from cache");
                FetchOutcome::respond(Response::offline_failure(), ResponseSource::Failed)
            }
            Err(e) => {
                tracing::warn!(error = %e, "offline page lookup failed");
                FetchOutcome::respond(Response::offline_failure(), ResponseSource::Failed)
            }
        }
    }
}
