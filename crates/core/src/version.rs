//! Cache version registry.
//!
//! The active cache generation is named `prefix + version`. The prefix marks
//! which cache names belong to this worker; activation only prunes names
//! carrying it. An empty prefix claims every name in the store.

use crate::Error;

/// Identifier of the active cache generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheVersion {
    prefix: String,
    name: String,
}

impl CacheVersion {
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if `version` is empty.
    pub fn new(prefix: impl Into<String>, version: impl Into<String>) -> Result<Self, Error> {
        let prefix = prefix.into();
        let version = version.into();
        if version.trim().is_empty() {
            return Err(Error::InvalidInput("cache version must not be empty".into()));
        }
        let name = format!("{prefix}{version}");
        Ok(Self { prefix, name })
    }

    /// Full cache name, e.g. `student-hub-v13`.
    pub fn cache_name(&self) -> &str {
        &self.name
    }

    /// Whether `name` lives in this worker's namespace.
    pub fn owns(&self, name: &str) -> bool {
        name.starts_with(&self.prefix)
    }

    /// Whether `name` is a generation of this worker other than the current one.
    pub fn is_stale(&self, name: &str) -> bool {
        self.owns(name) && name != self.name
    }
}

impl std::fmt::Display for CacheVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_name() {
        let v = CacheVersion::new("student-hub-", "v13").unwrap();
        assert_eq!(v.cache_name(), "student-hub-v13");
        assert_eq!(v.to_string(), "student-hub-v13");
    }

    #[test]
    fn test_empty_version_rejected() {
        assert!(matches!(CacheVersion::new("student-hub-", " "), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_stale_only_within_prefix() {
        let v = CacheVersion::new("student-hub-", "v13").unwrap();
        assert!(v.is_stale("student-hub-v12"));
        assert!(!v.is_stale("student-hub-v13"));
        assert!(!v.is_stale("fonts-cache"));
    }

    #[test]
    fn test_empty_prefix_owns_everything() {
        let v = CacheVersion::new("", "v2").unwrap();
        assert!(v.is_stale("v1"));
        assert!(v.is_stale("fonts-cache"));
        assert!(!v.is_stale("v2"));
    }
}
