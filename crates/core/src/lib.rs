//! Core types and shared functionality for medisw.
//!
//! This crate provides:
//! - Versioned cache stores with a SQLite backend
//! - Request/response values shared by the router and the network layer
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod http;

pub use cache::{CacheDb, CacheStore, CacheVersion};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use http::{Destination, Request, RequestMode, Response, ResponseType};
