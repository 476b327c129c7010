//! Request and response snapshots exchanged between the page, the cache and
//! the network.

use bytes::Bytes;
use http::{Method, StatusCode};
use url::Url;

/// Why a request was issued, as far as interception cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestMode {
    /// Top-level document load.
    Navigate,
    /// Same-origin subresource (script, stylesheet, image).
    #[default]
    SameOrigin,
    /// Cross-origin subresource fetched with CORS.
    Cors,
    /// Opaque cross-origin subresource.
    NoCors,
}

/// An outgoing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub mode: RequestMode,
}

impl Request {
    pub fn new(method: Method, url: Url, mode: RequestMode) -> Self {
        Self { method, url, mode }
    }

    /// A GET for a subresource.
    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url, RequestMode::SameOrigin)
    }

    /// A GET for a top-level document.
    pub fn navigate(url: Url) -> Self {
        Self::new(Method::GET, url, RequestMode::Navigate)
    }

    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }

    pub fn host(&self) -> Option<&str> {
        self.url.host_str()
    }
}

/// A response snapshot: status, headers and the full body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: StatusCode,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    /// Final URL the body was served from, if known.
    pub url: Option<Url>,
}

impl Response {
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self { status, headers: Vec::new(), body: body.into(), url: None }
    }

    /// Empty body with status 408, handed to subresource requests that failed
    /// offline so the page's own error handling runs instead of a rejection.
    pub fn offline_failure() -> Self {
        Self::new(StatusCode::REQUEST_TIMEOUT, Bytes::new())
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_url(mut self, url: Url) -> Self {
        self.url = Some(url);
        self
    }

    /// Status in the 200-299 range.
    pub fn is_ok(&self) -> bool {
        self.status.is_success()
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Approximate stored size, used for quota accounting.
    pub fn size(&self) -> usize {
        self.body.len() + self.headers.iter().map(|(k, v)| k.len() + v.len()).sum::<usize>()
    }
}
