//! Disk-backed store persistence
//!
//! One subdirectory per named store, one JSON file per entry. Keys contain
//! path separators and query characters, so filenames are the hex encoding
//! of the key. Writes go to a temp file and are renamed into place, which
//! gives the per-entry atomicity the reconciler depends on.

use crate::error::{ShellcacheError, ShellcacheResult};
use crate::store::{CacheStore, CachedResponse};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Filesystem-backed store set rooted at a single directory
#[derive(Debug, Clone)]
pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    /// Create a store set rooted at `root` (created lazily on first write)
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of this store set
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn store_dir(&self, store: &str) -> PathBuf {
        self.root.join(store)
    }

    fn entry_path(&self, store: &str, key: &str) -> PathBuf {
        self.store_dir(store).join(format!("{}.json", hex::encode(key)))
    }

    fn key_from_file_name(name: &str) -> Option<String> {
        let encoded = name.strip_suffix(".json")?;
        let bytes = hex::decode(encoded).ok()?;
        String::from_utf8(bytes).ok()
    }
}

#[async_trait]
impl CacheStore for DiskStore {
    async fn get(&self, store: &str, key: &str) -> ShellcacheResult<Option<CachedResponse>> {
        let path = self.entry_path(store, key);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path).await.map_err(|e| {
            ShellcacheError::StoreRead {
                store: store.to_string(),
                key: key.to_string(),
                reason: e.to_string(),
            }
        })?;

        let entry =
            serde_json::from_str(&content).map_err(|e| ShellcacheError::StoreCorrupt {
                store: store.to_string(),
                key: key.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Some(entry))
    }

    async fn put(&self, store: &str, key: &str, response: CachedResponse) -> ShellcacheResult<()> {
        let dir = self.store_dir(store);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| ShellcacheError::StoreOpen {
                store: store.to_string(),
                reason: e.to_string(),
            })?;

        let content = serde_json::to_string(&response)?;
        let path = self.entry_path(store, key);
        let tmp = path.with_extension("json.tmp");

        fs::write(&tmp, content)
            .await
            .map_err(|e| ShellcacheError::store_write(store, key, e.to_string()))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| ShellcacheError::store_write(store, key, e.to_string()))?;
        Ok(())
    }

    async fn delete(&self, store: &str, key: &str) -> ShellcacheResult<bool> {
        let path = self.entry_path(store, key);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path)
            .await
            .map_err(|e| ShellcacheError::store_write(store, key, e.to_string()))?;
        Ok(true)
    }

    async fn keys(&self, store: &str) -> ShellcacheResult<Vec<String>> {
        let dir = self.store_dir(store);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        let mut entries = fs::read_dir(&dir)
            .await
            .map_err(|e| ShellcacheError::StoreOpen {
                store: store.to_string(),
                reason: e.to_string(),
            })?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ShellcacheError::StoreOpen {
                store: store.to_string(),
                reason: e.to_string(),
            })?
        {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            // Skip temp files from interrupted writes
            if let Some(key) = Self::key_from_file_name(name) {
                keys.push(key);
            }
        }

        Ok(keys)
    }

    async fn delete_store(&self, store: &str) -> ShellcacheResult<()> {
        let dir = self.store_dir(store);
        if !dir.exists() {
            return Ok(());
        }
        fs::remove_dir_all(&dir)
            .await
            .map_err(|e| ShellcacheError::StoreOpen {
                store: store.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, DiskStore) {
        let dir = TempDir::new().unwrap();
        let store = DiskStore::new(dir.path());
        (dir, store)
    }

    #[tokio::test]
    async fn put_then_get_roundtrip() {
        let (_dir, store) = store();
        let resp = CachedResponse::new(
            200,
            vec![("content-type".to_string(), "text/html".to_string())],
            b"<html></html>".to_vec(),
        );
        store.put("content", "index.html", resp.clone()).await.unwrap();
        let back = store.get("content", "index.html").await.unwrap().unwrap();
        assert_eq!(back, resp);
    }

    #[tokio::test]
    async fn entries_survive_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let store = DiskStore::new(dir.path());
            store
                .put("content", "app.js", CachedResponse::ok(b"x".to_vec()))
                .await
                .unwrap();
        }
        let reopened = DiskStore::new(dir.path());
        assert!(reopened.get("content", "app.js").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn keys_decode_back_to_paths() {
        let (_dir, store) = store();
        store
            .put("content", "assets/logo.png", CachedResponse::ok(b"p".to_vec()))
            .await
            .unwrap();
        store
            .put("content", "/", CachedResponse::ok(b"r".to_vec()))
            .await
            .unwrap();

        let mut keys = store.keys("content").await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["/", "assets/logo.png"]);
    }

    #[tokio::test]
    async fn delete_store_removes_directory() {
        let (dir, store) = store();
        store
            .put("staging", "a", CachedResponse::ok(b"x".to_vec()))
            .await
            .unwrap();
        store.delete_store("staging").await.unwrap();
        assert!(!dir.path().join("staging").exists());
        assert!(store.keys("staging").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn corrupt_entry_surfaces_as_error() {
        let (dir, store) = store();
        let entry_dir = dir.path().join("content");
        tokio::fs::create_dir_all(&entry_dir).await.unwrap();
        tokio::fs::write(
            entry_dir.join(format!("{}.json", hex::encode("bad.js"))),
            "not json",
        )
        .await
        .unwrap();

        let err = store.get("content", "bad.js").await.unwrap_err();
        assert!(matches!(err, ShellcacheError::StoreCorrupt { .. }));
    }

    #[tokio::test]
    async fn temp_files_are_not_listed_as_keys() {
        let (dir, store) = store();
        let entry_dir = dir.path().join("content");
        tokio::fs::create_dir_all(&entry_dir).await.unwrap();
        tokio::fs::write(entry_dir.join("deadbeef.json.tmp"), "{}").await.unwrap();

        assert!(store.keys("content").await.unwrap().is_empty());
    }
}
