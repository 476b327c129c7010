//! Client code for hubcache.
//!
//! This crate provides the HTTP network backend used by the worker when a
//! request misses the cache or a manifest is pre-cached.

pub mod fetch;

pub use fetch::{FetchConfig, HttpNetwork};
