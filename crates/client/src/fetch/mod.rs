//! HTTP network backend for the offline worker.
//!
//! ### Behaviour
//! - Any HTTP status is a successful fetch; the worker decides what to cache
//! - Max redirects: 5
//! - Max body bytes: 5MB (configurable)
//! - Timeouts map to `FETCH_TIMEOUT`, other transport failures to
//!   `NETWORK_ERROR`; both trigger the offline fallback
//! - A body over the limit is `FETCH_TOO_LARGE`; the worker passes the
//!   request through rather than treating it as offline

use bytes::Bytes;
use reqwest::{Client, header};
use std::time::{Duration, Instant};

use hubcache_core::{AppConfig, Error, Network, Request, RequestMode, Response};

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "hubcache/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "hubcache/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            ..Default::default()
        }
    }
}

/// Network backed by a shared reqwest client.
pub struct HttpNetwork {
    http: Client,
    config: FetchConfig,
}

impl HttpNetwork {
    /// Create a new HTTP network with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Build from the loaded application config.
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        Self::new(FetchConfig::from(config))
    }

    fn too_large(&self, len: usize) -> Result<(), Error> {
        if len > self.config.max_bytes {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", len, self.config.max_bytes)));
        }
        Ok(())
    }
}

fn transport_error(e: &reqwest::Error) -> Error {
    if e.is_timeout() { Error::FetchTimeout(e.to_string()) } else { Error::Network(e.to_string()) }
}

fn accept_for(mode: RequestMode) -> &'static str {
    match mode {
        RequestMode::Navigate => "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        _ => "*/*",
    }
}

fn flatten_headers(headers: &header::HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
        .collect()
}

#[async_trait::async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let start = Instant::now();

        let response = self
            .http
            .request(request.method.clone(), request.url.as_str())
            .header(header::ACCEPT, accept_for(request.mode))
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        if let Some(len) = response.content_length() {
            self.too_large(usize::try_from(len).unwrap_or(usize::MAX))?;
        }

        let status = response.status();
        let final_url = response.url().clone();
        let headers = flatten_headers(response.headers());

        let bytes: Bytes = response.bytes().await.map_err(|e| transport_error(&e))?;
        self.too_large(bytes.len())?;

        tracing::debug!(
            "fetched {} -> {} ({}) in {}ms ({} bytes)",
            request.url,
            final_url,
            status.as_u16(),
            start.elapsed().as_millis(),
            bytes.len()
        );

        let mut out = Response::new(status, bytes).with_url(final_url);
        out.headers = headers;
        Ok(out)
    }
}
