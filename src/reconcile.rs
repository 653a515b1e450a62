//! Activation-phase cache reconciliation
//!
//! On activation the reconciler diffs the previously persisted manifest
//! against the one shipped with this deployment, prunes stale content
//! entries, promotes the staged shell downloads, and commits the new
//! manifest as the final step. A crash mid-way is observed on the next
//! activation as a missing or stale manifest, never as a manifest claiming
//! content that is not actually cached.
//!
//! The comparison trusts that whatever is cached under a path matches the
//! old manifest's fingerprint for that path. No code path may write to the
//! content store without the corresponding manifest update; cached bytes are
//! never re-hashed.

use crate::error::{ShellcacheError, ShellcacheResult};
use crate::manifest::{ResourceManifest, ROOT_ALIAS};
use crate::store::{CacheStore, CachedResponse, StoreNames};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Key under which the manifest record is stored in the manifest store
const MANIFEST_KEY: &str = "manifest";

/// What a successful reconciliation did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// No prior manifest: content was rebuilt from staging alone
    FreshInstall {
        /// Entries promoted from staging
        promoted: usize,
    },
    /// Prior manifest present: unchanged entries were reused
    Upgraded {
        /// Entries left in place (identical fingerprints)
        reused: usize,
        /// Stale entries removed
        deleted: usize,
        /// Entries promoted from staging
        promoted: usize,
    },
}

/// Diff-and-merge engine run at activation
pub struct Reconciler {
    store: Arc<dyn CacheStore>,
    names: StoreNames,
}

impl Reconciler {
    /// Create a reconciler over a store backend
    pub fn new(store: Arc<dyn CacheStore>, names: StoreNames) -> Self {
        Self { store, names }
    }

    /// Load the manifest persisted by the last successful reconciliation
    pub async fn load_previous_manifest(&self) -> ShellcacheResult<Option<ResourceManifest>> {
        let Some(record) = self.store.get(&self.names.manifest, MANIFEST_KEY).await? else {
            return Ok(None);
        };

        let json = String::from_utf8(record.body).map_err(|e| ShellcacheError::StoreCorrupt {
            store: self.names.manifest.clone(),
            key: MANIFEST_KEY.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Some(ResourceManifest::parse(&json)?))
    }

    /// Run a full reconciliation against `new_manifest`.
    ///
    /// On any storage failure the attempt is void: all three stores are
    /// deleted so the next activation starts from the fresh-install case,
    /// and the original error is surfaced to the caller.
    pub async fn reconcile(
        &self,
        new_manifest: &ResourceManifest,
    ) -> ShellcacheResult<ReconcileOutcome> {
        let activation = Uuid::new_v4();
        debug!(%activation, "starting reconciliation");

        match self.try_reconcile(new_manifest).await {
            Ok(outcome) => {
                info!(%activation, ?outcome, "reconciliation committed");
                Ok(outcome)
            }
            Err(e) => {
                error!(%activation, error = %e, "reconciliation failed, resetting all stores");
                self.reset_stores().await;
                Err(ShellcacheError::ReconcileFailed {
                    activation,
                    source: Box::new(e),
                })
            }
        }
    }

    async fn try_reconcile(
        &self,
        new_manifest: &ResourceManifest,
    ) -> ShellcacheResult<ReconcileOutcome> {
        match self.load_previous_manifest().await? {
            None => self.first_install(new_manifest).await,
            Some(old_manifest) => self.upgrade(&old_manifest, new_manifest).await,
        }
    }

    /// No prior manifest: any leftover content is untrustworthy, start over
    async fn first_install(
        &self,
        new_manifest: &ResourceManifest,
    ) -> ShellcacheResult<ReconcileOutcome> {
        self.store.delete_store(&self.names.content).await?;

        let promoted = self.promote_staging().await?;
        self.store.delete_store(&self.names.staging).await?;
        self.persist_manifest(new_manifest).await?;

        Ok(ReconcileOutcome::FreshInstall { promoted })
    }

    /// Prior manifest present: keep entries whose fingerprint is unchanged
    async fn upgrade(
        &self,
        old_manifest: &ResourceManifest,
        new_manifest: &ResourceManifest,
    ) -> ShellcacheResult<ReconcileOutcome> {
        let mut deleted = 0usize;
        let mut reused = 0usize;

        for key in self.store.keys(&self.names.content).await? {
            let path = logical_path(&key);

            // The cached entry is assumed to hold the old manifest's version
            // of this path. A shipped entry that dropped out of the manifest
            // or changed fingerprint is stale; anything else is byte-identical
            // across versions and safe to keep.
            let stale = match new_manifest.fingerprint(path) {
                None => true,
                Some(new_fp) => old_manifest.fingerprint(path) != Some(new_fp),
            };

            if stale {
                self.store.delete(&self.names.content, &key).await?;
                deleted += 1;
                debug!(path, "pruned stale entry");
            } else {
                reused += 1;
            }
        }

        // Shell files always win over survivors under the same path
        let promoted = self.promote_staging().await?;
        self.store.delete_store(&self.names.staging).await?;
        self.persist_manifest(new_manifest).await?;

        Ok(ReconcileOutcome::Upgraded {
            reused,
            deleted,
            promoted,
        })
    }

    /// Move every staged entry into the content store (overwriting)
    async fn promote_staging(&self) -> ShellcacheResult<usize> {
        let mut promoted = 0usize;

        for key in self.store.keys(&self.names.staging).await? {
            let entry = self
                .store
                .get(&self.names.staging, &key)
                .await?
                .ok_or_else(|| {
                    ShellcacheError::Internal(format!("staged entry {key} disappeared"))
                })?;
            self.store.put(&self.names.content, &key, entry).await?;
            promoted += 1;
        }

        Ok(promoted)
    }

    /// Persist the manifest record. Must stay the last mutating step of a
    /// reconciliation.
    async fn persist_manifest(&self, manifest: &ResourceManifest) -> ShellcacheResult<()> {
        let record = CachedResponse::ok(manifest.to_json()?.into_bytes());
        self.store
            .put(&self.names.manifest, MANIFEST_KEY, record)
            .await
    }

    /// Destructive-safe recovery: drop all three stores, returning the
    /// system to the no-prior-manifest state. Best effort; failures here
    /// only mean extra work on the next activation.
    async fn reset_stores(&self) {
        for name in [&self.names.content, &self.names.staging, &self.names.manifest] {
            if let Err(e) = self.store.delete_store(name).await {
                warn!(store = %name, error = %e, "failed to reset store during recovery");
            }
        }
    }
}

/// Derive the logical manifest path for a physical store key.
///
/// Keys are written as normalized paths, but an empty key (the bare origin)
/// still maps to the root alias.
fn logical_path(key: &str) -> &str {
    if key.is_empty() {
        ROOT_ALIAS
    } else {
        key
    }
}
