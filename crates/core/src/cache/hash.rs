//! Cache key generation.
//!
//! A cache entry is keyed by request method and canonical URL. The key is a
//! SHA-256 digest so both backends share one fixed-width representation.

use sha2::{Digest, Sha256};

use crate::request::Request;

/// Compute the cache key for a method and URL.
pub fn compute_cache_key(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.to_ascii_uppercase().as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

/// URL a request is stored under: fragment dropped.
pub fn request_url(request: &Request) -> String {
    let mut url = request.url.clone();
    url.set_fragment(None);
    url.to_string()
}

/// Cache key for a request.
pub fn request_key(request: &Request) -> String {
    compute_cache_key(request.method.as_str(), &request_url(request))
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    #[test]
    fn test_hash_stability() {
        let hash1 = compute_cache_key("GET", "https://hub.example/index.html");
        let hash2 = compute_cache_key("GET", "https://hub.example/index.html");
        assert_eq!(hash1, hash2);
    }

    #[test]
    fn test_hash_different_method() {
        let get = compute_cache_key("GET", "https://hub.example/index.html");
        let head = compute_cache_key("HEAD", "https://hub.example/index.html");
        assert_ne!(get, head);
    }

    #[test]
    fn test_hash_method_case_insensitive() {
        assert_eq!(
            compute_cache_key("get", "https://hub.example/"),
            compute_cache_key("GET", "https://hub.example/")
        );
    }

    #[test]
    fn test_hash_format() {
        let hash = compute_cache_key("GET", "https://hub.example/");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_request_key_ignores_fragment() {
        let plain = Request::get(Url::parse("https://hub.example/guides.html").unwrap());
        let anchored = Request::navigate(Url::parse("https://hub.example/guides.html#mistakes").unwrap());
        assert_eq!(request_key(&plain), request_key(&anchored));
    }
}
