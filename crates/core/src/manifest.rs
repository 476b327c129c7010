//! Asset manifest: the fixed, ordered list of resources an install must cache.

use std::collections::HashSet;

use url::Url;

use crate::Error;
use crate::scope::Scope;

/// Assets the portal needs for offline use.
pub const DEFAULT_ASSETS: &[&str] = &[
    "./",
    "./index.html",
    "./modules.html",
    "./personal.html",
    "./guides.html",
    "./guide-first-year.html",
    "./guide-study.html",
    "./guide-weekly.html",
    "./guide-mistakes.html",
    "./404.html",
    "./offline.html",
    "./style.css",
    "./manifest.json",
    "./nav.js",
    "./nav-auth.js",
    "./nav-mobile.js",
    "./page-transitions.js",
    "./icons.js",
    "./auth.js",
    "./personal.js",
    "./personal-inject.js",
    "./modules-data.js",
    "./updates.js",
    "./topbar-state.js",
    "./active-section.js",
    "./anchor-highlight.js",
    "./command-palette.js",
    "./contact.js",
    "./deep-link.js",
    "./theme.js",
    "./tip-of-day.js",
    "./back-to-top.js",
    "./sw-register.js",
];

/// Page served to navigations that fail offline.
pub const DEFAULT_OFFLINE_PAGE: &str = "./offline.html";

/// A manifest entry: the path as configured plus its resolved URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub path: String,
    pub url: Url,
}

/// Ordered, duplicate-free set of same-origin assets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    entries: Vec<ManifestEntry>,
    offline_page: Url,
}

impl Manifest {
    /// Resolve `paths` against `scope`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if the list is empty, holds two paths
    /// that resolve to the same URL, names a cross-origin URL, or does not
    /// contain `offline_page`.
    pub fn new<S: AsRef<str>>(scope: &Scope, paths: &[S], offline_page: &str) -> Result<Self, Error> {
        if paths.is_empty() {
            return Err(Error::InvalidInput("manifest must list at least one asset".into()));
        }

        let mut seen = HashSet::new();
        let mut entries = Vec::with_capacity(paths.len());
        for path in paths {
            let path = path.as_ref();
            let url = scope.resolve(path)?;
            if !scope.is_same_origin(&url) {
                return Err(Error::InvalidInput(format!("manifest entry is cross-origin: {path}")));
            }
            if !seen.insert(url.clone()) {
                return Err(Error::InvalidInput(format!("duplicate manifest entry: {path}")));
            }
            entries.push(ManifestEntry { path: path.to_string(), url });
        }

        let offline_page = scope.resolve(offline_page)?;
        if !seen.contains(&offline_page) {
            return Err(Error::InvalidInput(format!("offline page {offline_page} is not in the manifest")));
        }

        Ok(Self { entries, offline_page })
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    pub fn urls(&self) -> impl Iterator<Item = &Url> {
        self.entries.iter().map(|e| &e.url)
    }

    pub fn offline_page(&self) -> &Url {
        &self.offline_page
    }

}
