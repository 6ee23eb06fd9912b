//! Worker lifecycle: install, activate, and event dispatch.
//!
//! ### Install
//! - Fetch every manifest entry; any failure or non-2xx aborts the install
//!   and nothing is written. Entries land in one transaction.
//!
//! ### Activate
//! - Delete every store whose name is not the current version tag, then
//!   claim all open clients.
//!
//! ### Registration
//! - On development hosts the worker script is checked first. A missing or
//!   non-JavaScript script unregisters the worker: every store is dropped and
//!   clients are released. Without a network the check is skipped and
//!   nothing changes.
//!
//! ### Events
//! - [`WorkerEvent`] replaces platform event listeners; [`ServiceWorker::dispatch`]
//!   is the single entry point.

pub mod clients;
pub mod notify;

pub use clients::{ClientRegistry, WindowClient};
pub use notify::{Notification, NotificationCenter, PushPayload};

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use futures_util::future::try_join_all;
use medisw_core::{CacheDb, Error, Request};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::config::WorkerConfig;
use crate::fetch::Network;
use crate::router::{CacheRouter, RoutedResponse};

/// Lifecycle state of the worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    #[default]
    Parsed,
    Installing,
    /// Installed and waiting to activate.
    Installed,
    Activating,
    Activated,
    /// Install failed; a fresh install is required.
    Redundant,
    /// No longer registered; requests go straight to the network.
    Unregistered,
}

impl WorkerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerState::Parsed => "parsed",
            WorkerState::Installing => "installing",
            WorkerState::Installed => "installed",
            WorkerState::Activating => "activating",
            WorkerState::Activated => "activated",
            WorkerState::Redundant => "redundant",
            WorkerState::Unregistered => "unregistered",
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a successful install.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct InstallReport {
    pub cache_name: String,
    /// Manifest URLs now in the store, in manifest order.
    pub cached: Vec<String>,
    /// A previous version was in place, so this install is an update.
    pub update: bool,
}

/// Outcome of an activation.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ActivationReport {
    pub cache_name: String,
    /// Superseded stores that were deleted.
    pub deleted: Vec<String>,
    /// Clients that changed controller.
    pub claimed: usize,
}

/// Install followed, when skip-waiting is on, by activation.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct StartReport {
    pub install: InstallReport,
    pub activation: Option<ActivationReport>,
}

/// Outcome of [`ServiceWorker::unregister`].
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct UnregisterReport {
    /// Stores that were deleted.
    pub deleted: Vec<String>,
    /// Clients that lost their controller.
    pub released: usize,
}

/// Result of probing the worker script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ScriptCheck {
    Valid,
    /// 404, or served with a non-JavaScript content type.
    Missing,
    /// The network could not be reached.
    Offline,
}

/// Outcome of [`ServiceWorker::register`].
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Registration {
    Started(StartReport),
    Unregistered(UnregisterReport),
    Offline,
}

/// Something the platform asks the worker to handle.
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    Install,
    Activate,
    Fetch(Request),
    /// Raw push message data.
    Push(Bytes),
    NotificationClick(u64),
}

/// The worker's answer to a [`WorkerEvent`].
#[derive(Debug, Clone)]
pub enum WorkerReply {
    Installed(InstallReport),
    Activated(ActivationReport),
    Fetched(RoutedResponse),
    NotificationShown(Notification),
    WindowOpened(WindowClient),
}

/// The offline worker for one cache version.
pub struct ServiceWorker {
    config: Arc<WorkerConfig>,
    cache: CacheDb,
    network: Arc<dyn Network>,
    router: CacheRouter,
    state: RwLock<WorkerState>,
    clients: ClientRegistry,
    notifications: NotificationCenter,
}

impl ServiceWorker {
    pub fn new(config: WorkerConfig, cache: CacheDb, network: Arc<dyn Network>) -> Self {
        let config = Arc::new(config);
        let router = CacheRouter::new(config.clone(), cache.clone(), network.clone());
        Self {
            config,
            cache,
            network,
            router,
            state: RwLock::new(WorkerState::Parsed),
            clients: ClientRegistry::new(),
            notifications: NotificationCenter::new(),
        }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn cache(&self) -> &CacheDb {
        &self.cache
    }

    pub fn clients(&self) -> &ClientRegistry {
        &self.clients
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    async fn set_state(&self, state: WorkerState) {
        let mut current = self.state.write().await;
        tracing::debug!(from = %*current, to = %state, "worker state change");
        *current = state;
    }

    /// Populate the versioned store with the whole static manifest.
    ///
    /// # Errors
    ///
    /// Returns `Error::InstallFailed` if any entry cannot be fetched or
    /// answers with a non-2xx status. The store is left untouched.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        let cache_name = self.config.cache_name();
        self.set_state(WorkerState::Installing).await;
        tracing::info!(cache = %cache_name, assets = self.config.static_assets.len(), "installing");

        let outcome = match self.is_update(&cache_name).await {
            Ok(update) => self.precache(&cache_name).await.map(|cached| (update, cached)),
            Err(e) => Err(e),
        };

        match outcome {
            Ok((update, cached)) => {
                self.set_state(WorkerState::Installed).await;
                if update {
                    tracing::info!(cache = %cache_name, "new content is available and will be used once activated");
                } else {
                    tracing::info!(cache = %cache_name, "content is cached for offline use");
                }
                Ok(InstallReport { cache_name, cached, update })
            }
            Err(e) => {
                self.set_state(WorkerState::Redundant).await;
                tracing::error!(cache = %cache_name, "installation failed: {}", e);
                Err(e)
            }
        }
    }

    /// Another version already controls pages or owns a store.
    async fn is_update(&self, cache_name: &str) -> Result<bool, Error> {
        if self.clients.any_controlled().await {
            return Ok(true);
        }
        let names = self.cache.store_names().await?;
        Ok(names.iter().any(|name| name != cache_name))
    }

    async fn precache(&self, cache_name: &str) -> Result<Vec<String>, Error> {
        let fetches = self.config.static_assets.iter().map(|url| {
            let request = Request::get(url.clone());
            async move {
                let response = self
                    .network
                    .fetch(&request)
                    .await
                    .map_err(|e| Error::InstallFailed(format!("{}: {}", request.url, e)))?;
                if !response.ok() {
                    return Err(Error::InstallFailed(format!(
                        "{} returned status {}",
                        request.url, response.status
                    )));
                }
                if response.body.len() > self.config.max_entry_bytes {
                    return Err(Error::InstallFailed(format!(
                        "{} is {} bytes, over the {} byte cache limit",
                        request.url,
                        response.body.len(),
                        self.config.max_entry_bytes
                    )));
                }
                Ok((request, response))
            }
        });

        let entries = try_join_all(fetches).await?;
        let cached = entries.iter().map(|(req, _)| req.url.to_string()).collect();
        self.cache.store(cache_name).put_all(entries).await?;
        Ok(cached)
    }

    /// Drop superseded stores and take control of open clients.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if the worker has not installed, or a
    /// cache error if a store cannot be deleted.
    pub async fn activate(&self) -> Result<ActivationReport, Error> {
        let state = self.state().await;
        if !matches!(state, WorkerState::Installed | WorkerState::Activated) {
            return Err(Error::InvalidInput(format!("cannot activate a worker that is {state}")));
        }

        let cache_name = self.config.cache_name();
        self.set_state(WorkerState::Activating).await;
        tracing::info!(cache = %cache_name, "activating");

        let deleted = match self.cache.retain_only(&cache_name).await {
            Ok(deleted) => deleted,
            Err(e) => {
                self.set_state(state).await;
                tracing::error!(cache = %cache_name, "activation failed: {}", e);
                return Err(e);
            }
        };
        for name in &deleted {
            tracing::info!(cache = %name, "deleted old cache");
        }

        let claimed = self.clients.claim(&cache_name).await;
        self.set_state(WorkerState::Activated).await;
        tracing::info!(cache = %cache_name, claimed, "activated");

        Ok(ActivationReport { cache_name, deleted, claimed })
    }

    /// Install, then activate straight away unless skip-waiting is off.
    pub async fn start(&self) -> Result<StartReport, Error> {
        let install = self.install().await?;
        let activation = if self.config.skip_waiting { Some(self.activate().await?) } else { None };
        Ok(StartReport { install, activation })
    }

    /// Fetch the worker script the way a development host checks it before
    /// registering.
    pub async fn check_worker_script(&self) -> ScriptCheck {
        let request = Request::get(self.config.worker_script.clone()).with_header("Service-Worker", "script");
        match self.network.fetch(&request).await {
            Ok(response) => {
                let not_script = response
                    .content_type()
                    .is_some_and(|ct| !ct.contains("javascript"));
                if response.status == 404 || not_script {
                    tracing::warn!(
                        url = %request.url,
                        status = response.status,
                        content_type = ?response.content_type(),
                        "worker script not found"
                    );
                    ScriptCheck::Missing
                } else {
                    ScriptCheck::Valid
                }
            }
            Err(e) => {
                tracing::info!("no internet connection found, running in offline mode: {}", e);
                ScriptCheck::Offline
            }
        }
    }

    /// Register the worker: check the script on development hosts, then
    /// install and activate.
    pub async fn register(&self) -> Result<Registration, Error> {
        if self.config.is_development_host() {
            match self.check_worker_script().await {
                ScriptCheck::Valid => {}
                ScriptCheck::Missing => return self.unregister().await.map(Registration::Unregistered),
                ScriptCheck::Offline => return Ok(Registration::Offline),
            }
        }
        self.start().await.map(Registration::Started)
    }

    /// Stop intercepting requests, delete every store and release clients.
    pub async fn unregister(&self) -> Result<UnregisterReport, Error> {
        let previous = self.state().await;
        self.set_state(WorkerState::Unregistered).await;
        self.router.settle().await;

        let deleted = match self.cache.clear().await {
            Ok(deleted) => deleted,
            Err(e) => {
                self.set_state(previous).await;
                tracing::error!("unregister failed: {}", e);
                return Err(e);
            }
        };
        let released = self.clients.release().await;
        tracing::info!(deleted = deleted.len(), released, "worker unregistered");

        Ok(UnregisterReport { deleted, released })
    }

    /// Route one outbound request.
    pub async fn handle_fetch(&self, request: Request) -> Result<RoutedResponse, Error> {
        if self.state().await == WorkerState::Unregistered {
            return self.router.bypass(request).await;
        }
        self.router.handle(request).await
    }

    /// Show a notification for a push message.
    pub async fn handle_push(&self, data: &[u8]) -> Result<Notification, Error> {
        let payload = PushPayload::parse(data)?;
        Ok(self
            .notifications
            .show(
                payload,
                self.config.notification_icon.as_str(),
                self.config.notification_badge.as_str(),
            )
            .await)
    }

    /// Close the notification and bring up a window at its URL.
    pub async fn handle_notification_click(&self, id: u64) -> Result<WindowClient, Error> {
        let notification = self
            .notifications
            .close(id)
            .await
            .ok_or_else(|| Error::NotFound(format!("notification {id}")))?;
        let url = self.config.resolve(&notification.url)?;

        let controller = match self.state().await {
            WorkerState::Activated => Some(self.config.cache_name()),
            _ => None,
        };
        Ok(self.clients.open_window(&url, controller.as_deref()).await)
    }

    /// Handle one platform event.
    pub async fn dispatch(&self, event: WorkerEvent) -> Result<WorkerReply, Error> {
        match event {
            WorkerEvent::Install => self.install().await.map(WorkerReply::Installed),
            WorkerEvent::Activate => self.activate().await.map(WorkerReply::Activated),
            WorkerEvent::Fetch(request) => self.handle_fetch(request).await.map(WorkerReply::Fetched),
            WorkerEvent::Push(data) => self.handle_push(&data).await.map(WorkerReply::NotificationShown),
            WorkerEvent::NotificationClick(id) => self
                .handle_notification_click(id)
                .await
                .map(WorkerReply::WindowOpened),
        }
    }

    /// Wait for outstanding background cache writes.
    pub async fn settle(&self) {
        self.router.settle().await;
    }
}
