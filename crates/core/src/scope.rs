//! Site scope: the origin and base path the worker controls.
//!
//! ### URL Canonicalization
//! - Trim whitespace, resolve relative paths against the scope
//! - Lowercase host, remove fragments
//! - Preserve query string

use url::{Origin, Url};

/// Error type for URL canonicalization failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl From<UrlError> for crate::Error {
    fn from(err: UrlError) -> Self {
        crate::Error::InvalidUrl(err.to_string())
    }
}

/// Canonicalize an absolute URL so equal resources map to equal cache keys.
///
/// Normalization steps:
/// 1. Lowercase the host
/// 2. Remove fragment (#...)
/// 3. Keep query string intact (do not reorder)
pub fn canonicalize(mut url: Url) -> Result<Url, UrlError> {
    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    if let Some(host) = url.host_str() {
        let lower = host.to_lowercase();
        url.set_host(Some(&lower)).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    }

    url.set_fragment(None);

    Ok(url)
}

/// The base URL a worker is registered for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    base: Url,
}

impl Scope {
    /// Parse a scope URL. A base without a trailing slash is treated as a
    /// directory so `./` entries resolve beneath it.
    pub fn parse(input: &str) -> Result<Self, UrlError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(UrlError::Empty);
        }

        let mut base = Url::parse(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.set_query(None);

        Ok(Self { base: canonicalize(base)? })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn origin(&self) -> Origin {
        self.base.origin()
    }

    /// Resolve a relative path (`./index.html`) or absolute URL against the scope.
    pub fn resolve(&self, input: &str) -> Result<Url, UrlError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(UrlError::Empty);
        }

        let joined = self.base.join(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
        canonicalize(joined)
    }

    /// Whether the URL shares scheme, host and port with the scope.
    pub fn is_same_origin(&self, url: &Url) -> bool {
        url.origin() == self.base.origin()
    }
}
