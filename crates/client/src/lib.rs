//! Offline cache router and worker lifecycle for medisw.
//!
//! This crate provides the network seam, the request router that decides
//! between cache and network, and the install/activate/push lifecycle that
//! the server drives.

pub mod config;
pub mod fetch;
pub mod router;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

pub use config::WorkerConfig;
pub use fetch::{FetchClient, FetchConfig, Network};
pub use router::{CacheRouter, RequestClass, ResponseSource, RoutedResponse, classify};
pub use worker::{
    ActivationReport, ClientRegistry, InstallReport, Notification, NotificationCenter, PushPayload, Registration,
    ScriptCheck, ServiceWorker, StartReport, UnregisterReport, WindowClient, WorkerEvent, WorkerReply, WorkerState,
};
