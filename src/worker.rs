//! Lifecycle controller
//!
//! `CacheWorker` ties the pieces together: install stages the shell,
//! activate runs the reconciler and claims clients, fetch goes through the
//! router, and control messages drive immediate activation or a full
//! offline prefetch. Configuration (manifest, shell, store names) is
//! injected at construction and immutable for the worker's lifetime.

use crate::error::{ShellcacheError, ShellcacheResult};
use crate::fetch::{FetchMode, Fetcher};
use crate::manifest::{ResourceManifest, ShellSet};
use crate::reconcile::{ReconcileOutcome, Reconciler};
use crate::router::{FetchRequest, Routed, Router};
use crate::store::{CacheStore, StoreNames};
use async_trait::async_trait;
use futures_util::future::try_join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

/// Per-deployment worker configuration, loaded once and immutable
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Desired cache state for this deployment
    pub manifest: ResourceManifest,

    /// Paths that must be staged before install completes
    pub shell: ShellSet,

    /// Origin the worker serves (scheme + host)
    pub origin: String,

    /// Names of the three backing stores
    pub store_names: StoreNames,
}

/// Page sessions controlled by the worker
#[async_trait]
pub trait ClientRegistry: Send + Sync {
    /// Take control of all currently open page sessions
    async fn claim(&self) -> ShellcacheResult<()>;
}

/// Registry for embedders with no page sessions to claim (CLI, tests)
pub struct NoopClients;

#[async_trait]
impl ClientRegistry for NoopClients {
    async fn claim(&self) -> ShellcacheResult<()> {
        Ok(())
    }
}

/// Recognized control-channel signals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMessage {
    /// Activate the waiting worker immediately; the sending page must
    /// reload itself afterwards
    SkipWaiting,
    /// Fetch and store every manifest path not yet cached
    DownloadOffline,
}

impl ControlMessage {
    /// Parse a wire string; unknown payloads are `None`
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "skipWaiting" => Some(Self::SkipWaiting),
            "downloadOffline" => Some(Self::DownloadOffline),
            _ => None,
        }
    }
}

/// Lifecycle events the worker consumes
#[derive(Debug, Clone)]
pub enum LifecycleEvent {
    Install,
    Activate,
    Fetch(FetchRequest),
    Message(ControlMessage),
}

/// Result of handling one lifecycle event
#[derive(Debug)]
pub enum EventOutcome {
    /// Install staged this many shell entries
    Installed { staged: usize },
    /// Activation reconciled the caches
    Activated(ReconcileOutcome),
    /// A fetch was routed
    Fetched(Routed),
    /// Clients were claimed in response to a skip-waiting signal
    Claimed,
    /// The offline sweep stored this many missing entries
    Prefetched { fetched: usize },
}

/// Service-worker-style cache controller
pub struct CacheWorker {
    config: WorkerConfig,
    store: Arc<dyn CacheStore>,
    fetcher: Arc<dyn Fetcher>,
    clients: Arc<dyn ClientRegistry>,
    reconciler: Reconciler,
    router: Router,
}

impl CacheWorker {
    /// Build a worker; validates the manifest/shell pairing up front
    pub fn new(
        config: WorkerConfig,
        store: Arc<dyn CacheStore>,
        fetcher: Arc<dyn Fetcher>,
        clients: Arc<dyn ClientRegistry>,
    ) -> ShellcacheResult<Self> {
        config.manifest.validate(&config.shell)?;

        let manifest = Arc::new(config.manifest.clone());
        let reconciler = Reconciler::new(store.clone(), config.store_names.clone());
        let router = Router::new(
            manifest,
            config.origin.clone(),
            store.clone(),
            fetcher.clone(),
            config.store_names.clone(),
        );

        Ok(Self {
            config,
            store,
            fetcher,
            clients,
            reconciler,
            router,
        })
    }

    /// Dispatch one lifecycle event to its handler
    pub async fn handle_event(&self, event: LifecycleEvent) -> ShellcacheResult<EventOutcome> {
        match event {
            LifecycleEvent::Install => self.handle_install().await,
            LifecycleEvent::Activate => self.handle_activate().await,
            LifecycleEvent::Fetch(request) => self.handle_fetch(&request).await,
            LifecycleEvent::Message(message) => self.handle_message(message).await,
        }
    }

    /// Install: stage every shell path, bypassing intermediate HTTP caches.
    /// A single failure fails the whole step; partially staged entries are
    /// harmless because every activation ends by discarding the staging
    /// store.
    pub async fn handle_install(&self) -> ShellcacheResult<EventOutcome> {
        let fetches = self.config.shell.paths().map(|path| {
            let fetcher = self.fetcher.clone();
            async move {
                let response = fetcher.fetch(path, FetchMode::Reload).await.map_err(|e| {
                    ShellcacheError::InstallFetch {
                        path: path.to_string(),
                        reason: e.to_string(),
                    }
                })?;
                if !response.is_ok() {
                    return Err(ShellcacheError::InstallStatus {
                        path: path.to_string(),
                        status: response.status,
                    });
                }
                Ok((path, response))
            }
        });

        let staged = try_join_all(fetches).await?;
        let count = staged.len();
        for (path, response) in staged {
            self.store
                .put(&self.config.store_names.staging, path, response)
                .await?;
        }

        info!(staged = count, "install complete");
        Ok(EventOutcome::Installed { staged: count })
    }

    /// Activate: reconcile the caches, then take over all open clients
    pub async fn handle_activate(&self) -> ShellcacheResult<EventOutcome> {
        let outcome = self.reconciler.reconcile(&self.config.manifest).await?;
        self.clients.claim().await?;
        Ok(EventOutcome::Activated(outcome))
    }

    /// Fetch: route one intercepted request
    pub async fn handle_fetch(&self, request: &FetchRequest) -> ShellcacheResult<EventOutcome> {
        Ok(EventOutcome::Fetched(self.router.handle(request).await?))
    }

    /// Handle a parsed control message
    pub async fn handle_message(&self, message: ControlMessage) -> ShellcacheResult<EventOutcome> {
        match message {
            ControlMessage::SkipWaiting => {
                info!("skip-waiting requested, claiming clients");
                self.clients.claim().await?;
                Ok(EventOutcome::Claimed)
            }
            ControlMessage::DownloadOffline => {
                let fetched = self.prefetch_missing().await?;
                Ok(EventOutcome::Prefetched { fetched })
            }
        }
    }

    /// Handle a raw control string; unknown payloads are ignored
    pub async fn handle_raw_message(
        &self,
        raw: &str,
    ) -> ShellcacheResult<Option<EventOutcome>> {
        match ControlMessage::parse(raw) {
            Some(message) => Ok(Some(self.handle_message(message).await?)),
            None => {
                debug!(raw, "ignoring unrecognized control message");
                Ok(None)
            }
        }
    }

    /// Fetch and store every manifest path missing from the content store.
    /// Fails on the first path that cannot be fetched with a 2xx.
    pub async fn prefetch_missing(&self) -> ShellcacheResult<usize> {
        let names = &self.config.store_names;
        let present: HashSet<String> = self
            .store
            .keys(&names.content)
            .await?
            .into_iter()
            .collect();

        let mut fetched = 0usize;
        for path in self.config.manifest.paths() {
            if present.contains(path) {
                continue;
            }

            let response = self
                .fetcher
                .fetch(path, FetchMode::Default)
                .await
                .map_err(|e| ShellcacheError::Prefetch {
                    path: path.to_string(),
                    reason: e.to_string(),
                })?;
            if !response.is_ok() {
                return Err(ShellcacheError::Prefetch {
                    path: path.to_string(),
                    reason: format!("status {}", response.status),
                });
            }

            self.store.put(&names.content, path, response).await?;
            fetched += 1;
        }

        info!(fetched, "offline prefetch complete");
        Ok(fetched)
    }

    /// The router, for callers that only need the fetch path
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// The reconciler, for status inspection
    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    /// This worker's configuration
    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }
}
