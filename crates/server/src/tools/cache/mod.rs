//! Cache inspection MCP tools.
//!
//! These work on the stores directly, bypassing the router.

pub mod delete;
pub mod list;

pub use delete::{CacheDeleteParams, delete_impl};
pub use list::{CacheListParams, list_impl};
