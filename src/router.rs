//! Per-request routing policy
//!
//! Each intercepted request gets a synchronous [`RouteDecision`] from its
//! method and normalized path, then the async executor carries it out:
//! cache-first with lazy population for manifest assets, online-first for
//! the root document, pass-through for everything else.

use crate::error::ShellcacheResult;
use crate::fetch::{FetchMode, Fetcher};
use crate::manifest::{normalize_request_path, ResourceManifest, ROOT_ALIAS};
use crate::store::{CacheStore, StoreNames};
use std::sync::Arc;
use tracing::debug;

/// An intercepted request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// HTTP method, uppercase
    pub method: String,
    /// Full request URL
    pub url: String,
}

impl FetchRequest {
    /// Convenience constructor for a GET request
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: "GET".to_string(),
            url: url.into(),
        }
    }
}

/// Routing strategy chosen for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// Not intercepted; default network handling applies
    PassThrough,
    /// Root document: network first, cache fallback
    OnlineFirst { path: String },
    /// Manifest asset: cache hit or fetch-and-populate
    CacheFirst { path: String },
}

/// Where a routed response came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    /// Served from the content store
    Cache,
    /// Served from the network
    Network,
}

/// Outcome of routing one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routed {
    /// The request was not intercepted
    Bypass,
    /// A response was produced
    Response {
        response: crate::store::CachedResponse,
        source: ResponseSource,
    },
}

/// Fetch-path router over one deployment's manifest
pub struct Router {
    manifest: Arc<ResourceManifest>,
    origin: String,
    store: Arc<dyn CacheStore>,
    fetcher: Arc<dyn Fetcher>,
    names: StoreNames,
}

impl Router {
    /// Create a router for one deployed manifest
    pub fn new(
        manifest: Arc<ResourceManifest>,
        origin: impl Into<String>,
        store: Arc<dyn CacheStore>,
        fetcher: Arc<dyn Fetcher>,
        names: StoreNames,
    ) -> Self {
        Self {
            manifest,
            origin: origin.into(),
            store,
            fetcher,
            names,
        }
    }

    /// Decide the strategy for a request. Synchronous and side-effect free.
    pub fn decide(&self, method: &str, url: &str) -> RouteDecision {
        if method != "GET" {
            return RouteDecision::PassThrough;
        }

        let Some(path) = normalize_request_path(url, &self.origin) else {
            return RouteDecision::PassThrough;
        };

        if !self.manifest.contains(&path) {
            return RouteDecision::PassThrough;
        }

        if path == ROOT_ALIAS {
            RouteDecision::OnlineFirst { path }
        } else {
            RouteDecision::CacheFirst { path }
        }
    }

    /// Route a request end to end
    pub async fn handle(&self, request: &FetchRequest) -> ShellcacheResult<Routed> {
        match self.decide(&request.method, &request.url) {
            RouteDecision::PassThrough => {
                debug!(url = %request.url, "pass-through");
                Ok(Routed::Bypass)
            }
            RouteDecision::OnlineFirst { path } => self.online_first(&path).await,
            RouteDecision::CacheFirst { path } => self.cache_first(&path).await,
        }
    }

    /// Cache hit wins; on a miss fetch and cache only 2xx responses. A
    /// transport failure propagates with nothing cached and no retry.
    async fn cache_first(&self, path: &str) -> ShellcacheResult<Routed> {
        if let Some(cached) = self.store.get(&self.names.content, path).await? {
            debug!(path, "cache hit");
            return Ok(Routed::Response {
                response: cached,
                source: ResponseSource::Cache,
            });
        }

        let response = self.fetcher.fetch(path, FetchMode::Default).await?;
        if response.is_ok() {
            self.store
                .put(&self.names.content, path, response.clone())
                .await?;
            debug!(path, "lazily populated");
        }
        Ok(Routed::Response {
            response,
            source: ResponseSource::Network,
        })
    }

    /// Network wins; any resolved response refreshes the cached copy. Only
    /// a transport failure falls back to the cache, and with no cached
    /// entry the original failure propagates.
    async fn online_first(&self, path: &str) -> ShellcacheResult<Routed> {
        match self.fetcher.fetch(path, FetchMode::Default).await {
            Ok(response) => {
                self.store
                    .put(&self.names.content, path, response.clone())
                    .await?;
                Ok(Routed::Response {
                    response,
                    source: ResponseSource::Network,
                })
            }
            Err(network_err) => {
                debug!(path, error = %network_err, "network failed, trying cache fallback");
                match self.store.get(&self.names.content, path).await? {
                    Some(cached) => Ok(Routed::Response {
                        response: cached,
                        source: ResponseSource::Cache,
                    }),
                    None => Err(network_err),
                }
            }
        }
    }
}
