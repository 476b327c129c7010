//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (HUBCACHE_*)
//! 2. TOML config file (if HUBCACHE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Deserializer, Serialize, de};

use crate::manifest::{DEFAULT_ASSETS, DEFAULT_OFFLINE_PAGE, Manifest};
use crate::scope::Scope;
use crate::version::CacheVersion;
use crate::worker::WorkerConfig;

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (HUBCACHE_*)
/// 2. TOML config file (if HUBCACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite cache store.
    ///
    /// Set via HUBCACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Base URL of the site the worker controls.
    ///
    /// Set via HUBCACHE_SCOPE environment variable.
    #[serde(default = "default_scope")]
    pub scope: String,

    /// Namespace prefix for cache names owned by this worker.
    ///
    /// Set via HUBCACHE_CACHE_PREFIX environment variable. Empty means every
    /// cache in the store is pruned on activation.
    #[serde(default = "default_cache_prefix", deserialize_with = "string_or_number")]
    pub cache_prefix: String,

    /// Deployment version; bump on every deploy that changes an asset.
    ///
    /// Set via HUBCACHE_CACHE_VERSION environment variable.
    #[serde(default = "default_cache_version", deserialize_with = "string_or_number")]
    pub cache_version: String,

    /// Assets to pre-cache at install, relative to `scope`.
    ///
    /// Set via HUBCACHE_MANIFEST environment variable (`[./a.html,./b.css]`).
    #[serde(default = "default_manifest")]
    pub manifest: Vec<String>,

    /// Page served for navigations that fail offline. Must be in `manifest`.
    ///
    /// Set via HUBCACHE_OFFLINE_PAGE environment variable.
    #[serde(default = "default_offline_page")]
    pub offline_page: String,

    /// Hosts of the external auth/content API; never intercepted or cached.
    ///
    /// Set via HUBCACHE_API_HOSTS environment variable (`[workers.dev]`).
    #[serde(default = "default_api_hosts")]
    pub api_hosts: Vec<String>,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via HUBCACHE_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via HUBCACHE_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum bytes to fetch per request.
    ///
    /// Set via HUBCACHE_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
}

/// Accept `14` as well as `"14"`. The env provider parses
/// `HUBCACHE_CACHE_VERSION=14` as an integer.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrNumber;

    impl de::Visitor<'_> for StringOrNumber {
        type Value = String;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            f.write_str("a string or a number")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_string<E: de::Error>(self, v: String) -> Result<String, E> {
            Ok(v)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<String, E> {
            Ok(v.to_string())
        }
    }

    deserializer.deserialize_any(StringOrNumber)
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./hubcache.sqlite")
}

fn default_scope() -> String {
    "http://localhost:8080/".into()
}

fn default_cache_prefix() -> String {
    "student-hub-".into()
}

fn default_cache_version() -> String {
    "v13".into()
}

fn default_manifest() -> Vec<String> {
    DEFAULT_ASSETS.iter().map(|s| s.to_string()).collect()
}

fn default_offline_page() -> String {
    DEFAULT_OFFLINE_PAGE.into()
}

fn default_api_hosts() -> Vec<String> {
    vec!["workers.dev".into()]
}

fn default_user_agent() -> String {
    "hubcache/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            scope: default_scope(),
            cache_prefix: default_cache_prefix(),
            cache_version: default_cache_version(),
            manifest: default_manifest(),
            offline_page: default_offline_page(),
            api_hosts: default_api_hosts(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_bytes: default_max_bytes(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `HUBCACHE_`
    /// 2. TOML file from `HUBCACHE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("HUBCACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("HUBCACHE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Parsed site scope.
    pub fn scope(&self) -> Result<Scope, ConfigError> {
        Scope::parse(&self.scope).map_err(|e| ConfigError::Invalid { field: "scope".into(), reason: e.to_string() })
    }

    /// Cache version registry entry for this deployment.
    pub fn cache_version(&self) -> Result<CacheVersion, ConfigError> {
        CacheVersion::new(&self.cache_prefix, &self.cache_version)
            .map_err(|e| ConfigError::Invalid { field: "cache_version".into(), reason: e.to_string() })
    }

    /// Manifest resolved against the scope.
    pub fn manifest(&self) -> Result<Manifest, ConfigError> {
        let scope = self.scope()?;
        Manifest::new(&scope, &self.manifest, &self.offline_page)
            .map_err(|e| ConfigError::Invalid { field: "manifest".into(), reason: e.to_string() })
    }

    /// Everything a worker needs, resolved and checked.
    pub fn worker_config(&self) -> Result<WorkerConfig, ConfigError> {
        Ok(WorkerConfig {
            scope: self.scope()?,
            version: self.cache_version()?,
            manifest: self.manifest()?,
            api_hosts: self.api_hosts.clone(),
        })
    }
}
