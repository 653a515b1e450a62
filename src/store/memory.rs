//! In-memory store backend

use crate::error::ShellcacheResult;
use crate::store::{CacheStore, CachedResponse};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Mutex-guarded in-memory backend, used by tests and embedded callers
#[derive(Debug, Default)]
pub struct MemoryStore {
    stores: Mutex<HashMap<String, HashMap<String, CachedResponse>>>,
}

impl MemoryStore {
    /// Create an empty store set
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, store: &str, key: &str) -> ShellcacheResult<Option<CachedResponse>> {
        let stores = self.stores.lock().await;
        Ok(stores.get(store).and_then(|s| s.get(key)).cloned())
    }

    async fn put(&self, store: &str, key: &str, response: CachedResponse) -> ShellcacheResult<()> {
        let mut stores = self.stores.lock().await;
        stores
            .entry(store.to_string())
            .or_default()
            .insert(key.to_string(), response);
        Ok(())
    }

    async fn delete(&self, store: &str, key: &str) -> ShellcacheResult<bool> {
        let mut stores = self.stores.lock().await;
        Ok(stores
            .get_mut(store)
            .map(|s| s.remove(key).is_some())
            .unwrap_or(false))
    }

    async fn keys(&self, store: &str) -> ShellcacheResult<Vec<String>> {
        let stores = self.stores.lock().await;
        Ok(stores
            .get(store)
            .map(|s| s.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn delete_store(&self, store: &str) -> ShellcacheResult<()> {
        let mut stores = self.stores.lock().await;
        stores.remove(store);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_get_delete() {
        let store = MemoryStore::new();
        assert_eq!(store.get("content", "app.js").await.unwrap(), None);

        store
            .put("content", "app.js", CachedResponse::ok(b"console.log(1)".to_vec()))
            .await
            .unwrap();
        let entry = store.get("content", "app.js").await.unwrap().unwrap();
        assert_eq!(entry.body, b"console.log(1)");

        assert!(store.delete("content", "app.js").await.unwrap());
        assert!(!store.delete("content", "app.js").await.unwrap());
    }

    #[tokio::test]
    async fn stores_are_isolated() {
        let store = MemoryStore::new();
        store
            .put("staging", "a", CachedResponse::ok(b"x".to_vec()))
            .await
            .unwrap();
        assert_eq!(store.get("content", "a").await.unwrap(), None);
        assert_eq!(store.keys("staging").await.unwrap(), vec!["a"]);
    }

    #[tokio::test]
    async fn delete_store_removes_all_keys() {
        let store = MemoryStore::new();
        store
            .put("staging", "a", CachedResponse::ok(b"x".to_vec()))
            .await
            .unwrap();
        store
            .put("staging", "b", CachedResponse::ok(b"y".to_vec()))
            .await
            .unwrap();
        store.delete_store("staging").await.unwrap();
        assert!(store.keys("staging").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_store_reads_as_empty() {
        let store = MemoryStore::new();
        assert!(store.keys("nope").await.unwrap().is_empty());
        store.delete_store("nope").await.unwrap();
    }
}
