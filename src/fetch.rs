//! Network fetch abstraction
//!
//! The lifecycle controller and router talk to the network through the
//! [`Fetcher`] trait so tests can substitute a scripted fetcher. The real
//! implementation wraps a blocking ureq agent in `spawn_blocking`.

use crate::error::{ShellcacheError, ShellcacheResult};
use crate::store::CachedResponse;
use async_trait::async_trait;
use ureq::Agent;

/// How a fetch should interact with intermediate HTTP caches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Normal request; intermediate caches may answer
    Default,
    /// Force revalidation at the origin (install-phase shell downloads)
    Reload,
}

/// Abstract network fetch, keyed by manifest path
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch a path from the origin.
    ///
    /// Non-2xx statuses are returned as responses, not errors; an `Err` means
    /// the transport itself failed (DNS, refused connection, timeout).
    async fn fetch(&self, path: &str, mode: FetchMode) -> ShellcacheResult<CachedResponse>;
}

/// HTTP fetcher against a single origin
pub struct HttpFetcher {
    origin: String,
    agent: Agent,
}

impl HttpFetcher {
    /// Create a fetcher for `origin` (scheme + host, no trailing slash needed)
    pub fn new(origin: impl Into<String>) -> Self {
        // Statuses stay responses; the router decides what a 404 means.
        let agent: Agent = Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            origin: origin.into().trim_end_matches('/').to_string(),
            agent,
        }
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.origin, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, path: &str, mode: FetchMode) -> ShellcacheResult<CachedResponse> {
        let agent = self.agent.clone();
        let url = self.url_for(path);
        let path = path.to_string();

        tokio::task::spawn_blocking(move || {
            let mut request = agent.get(&url);
            if mode == FetchMode::Reload {
                request = request.header("Cache-Control", "no-cache");
            }

            let mut response = request
                .call()
                .map_err(|e| ShellcacheError::fetch(&path, e.to_string()))?;

            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|v| (name.as_str().to_string(), v.to_string()))
                })
                .collect();
            let body = response
                .body_mut()
                .read_to_vec()
                .map_err(|e| ShellcacheError::fetch(&path, e.to_string()))?;

            Ok(CachedResponse::new(status, headers, body))
        })
        .await
        .map_err(|e| ShellcacheError::Internal(format!("fetch task failed: {e}")))?
    }
}
