//! Named key-value stores for cached responses
//!
//! Mirrors the platform cache model: a small set of named stores, each
//! holding path-keyed response entries. Operations are atomic per entry;
//! there are no cross-entry transactions. The reconciler relies on exactly
//! that guarantee and nothing more.
//!
//! Three logical stores exist, named by [`StoreNames`]:
//!
//! | Store | Role |
//! |-------|------|
//! | manifest | single persisted manifest record |
//! | staging | transient install-phase shell downloads |
//! | content | durable production cache the fetch path reads |

pub mod disk;
pub mod memory;

pub use disk::DiskStore;
pub use memory::MemoryStore;

use crate::error::ShellcacheResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored response: status, headers, body and when it was stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResponse {
    /// HTTP status code
    pub status: u16,

    /// Response headers as received
    pub headers: Vec<(String, String)>,

    /// Response body, hex-encoded on disk
    #[serde(with = "hex_body")]
    pub body: Vec<u8>,

    /// When the entry was stored
    pub stored_at: DateTime<Utc>,
}

impl CachedResponse {
    /// Create a response stored now
    pub fn new(status: u16, headers: Vec<(String, String)>, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
            stored_at: Utc::now(),
        }
    }

    /// Shorthand for a 200 response with no headers
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self::new(200, Vec::new(), body.into())
    }

    /// Whether the status is 2xx (the only responses worth caching lazily)
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Hex-encode response bodies so entries stay valid JSON
mod hex_body {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(body: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        hex::encode(body).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(&s).map_err(serde::de::Error::custom)
    }
}

/// Names of the three logical stores.
///
/// Names must be stable across worker versions: activation finds the previous
/// deployment's content by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreNames {
    /// Store holding the single persisted manifest record
    pub manifest: String,

    /// Transient store populated during install
    pub staging: String,

    /// Durable store the fetch path serves from
    pub content: String,
}

impl Default for StoreNames {
    fn default() -> Self {
        Self {
            manifest: "app-manifest".to_string(),
            staging: "app-temp-cache".to_string(),
            content: "app-content-cache".to_string(),
        }
    }
}

/// Abstract named-store backend
///
/// Implementations must make each operation atomic per (store, key) pair.
/// Reading a missing store behaves like reading an empty one; deleting a
/// missing store or key is not an error.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Read an entry, `None` if absent
    async fn get(&self, store: &str, key: &str) -> ShellcacheResult<Option<CachedResponse>>;

    /// Write an entry, replacing any existing one
    async fn put(&self, store: &str, key: &str, response: CachedResponse) -> ShellcacheResult<()>;

    /// Delete an entry, returning whether it existed
    async fn delete(&self, store: &str, key: &str) -> ShellcacheResult<bool>;

    /// List all keys currently present in a store
    async fn keys(&self, store: &str) -> ShellcacheResult<Vec<String>>;

    /// Delete a store and everything in it
    async fn delete_store(&self, store: &str) -> ShellcacheResult<()>;
}
