//! SQLite-backed cache stores for captured HTTP responses.
//!
//! This module provides named, versioned response stores using SQLite with
//! async access via tokio-rusqlite. It supports:
//!
//! - Request identity keys (method + URL) hashed with SHA-256
//! - Atomic bulk writes for install-time manifests
//! - Whole-store deletion when a newer version supersedes it
//! - Automatic schema migrations and WAL mode for concurrent access

pub mod connection;
pub mod entries;
pub mod hash;
pub mod migrations;
pub mod stores;
pub mod version;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::CacheStore;
pub use stores::StoreSummary;
pub use version::CacheVersion;
