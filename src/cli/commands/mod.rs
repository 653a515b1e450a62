//! CLI command implementations

pub mod fetch;
pub mod install;
pub mod prefetch;
pub mod status;

pub use fetch::execute as fetch;
pub use install::execute as install;
pub use prefetch::execute as prefetch;
pub use status::execute as status;

use crate::config::Config;
use crate::error::ShellcacheResult;
use crate::fetch::HttpFetcher;
use crate::store::DiskStore;
use crate::worker::{CacheWorker, NoopClients};
use std::sync::Arc;

/// Assemble a worker over the disk-backed mirror described by `config`
pub(crate) async fn build_worker(config: &Config) -> ShellcacheResult<CacheWorker> {
    let worker_config = config.worker_config().await?;
    let store = Arc::new(DiskStore::new(config.mirror_dir()));
    let fetcher = Arc::new(HttpFetcher::new(&config.origin));
    CacheWorker::new(worker_config, store, fetcher, Arc::new(NoopClients))
}
