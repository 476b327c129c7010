//! Core types and lifecycle logic for hubcache.
//!
//! This crate provides:
//! - Cache storage abstraction with in-memory and SQLite backends
//! - Asset manifest, cache versioning and site scope handling
//! - Worker lifecycle: install, activate, fetch interception and registration
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod manifest;
pub mod network;
pub mod request;
pub mod scope;
pub mod version;
pub mod worker;

pub use cache::{CacheDb, CacheStorage, MemoryStorage};
pub use config::AppConfig;
pub use error::Error;
pub use manifest::Manifest;
pub use network::Network;
pub use request::{Request, RequestMode, Response};
pub use scope::Scope;
pub use version::CacheVersion;
pub use worker::{
    ActivationReport, ClientRegistry, FetchOutcome, InstallReport, LifecycleController, OfflineWorker,
    PassthroughReason, Registration, ResponseSource, UpdateOutcome, WorkerConfig, WorkerState,
};
