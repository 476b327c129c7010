//! Versioned cache storage.
//!
//! A store holds named cache generations, each mapping requests to response
//! snapshots. Two backends implement [`CacheStorage`]:
//!
//! - [`MemoryStorage`]: in-process map with an optional byte quota
//! - [`CacheDb`]: persistent SQLite store with automatic schema migrations,
//!   WAL mode and cascading generation deletes

pub mod connection;
pub mod generations;
pub mod hash;
pub mod memory;
pub mod migrations;
pub mod storage;

pub use crate::Error;

pub use connection::CacheDb;
pub use memory::MemoryStorage;
pub use storage::CacheStorage;
