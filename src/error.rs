//! Error types for shellcache
//!
//! All modules use `ShellcacheResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for shellcache operations
pub type ShellcacheResult<T> = Result<T, ShellcacheError>;

/// All errors that can occur in shellcache
#[derive(Error, Debug)]
pub enum ShellcacheError {
    // Manifest errors
    #[error("Invalid resource manifest: {0}")]
    ManifestInvalid(String),

    #[error("Manifest file not found: {0}")]
    ManifestNotFound(PathBuf),

    #[error("Shell path not present in manifest: {0}")]
    ShellPathUnknown(String),

    // Store errors
    #[error("Failed to open store {store}: {reason}")]
    StoreOpen { store: String, reason: String },

    #[error("Failed to read entry {key} from store {store}: {reason}")]
    StoreRead {
        store: String,
        key: String,
        reason: String,
    },

    #[error("Failed to write entry {key} to store {store}: {reason}")]
    StoreWrite {
        store: String,
        key: String,
        reason: String,
    },

    #[error("Corrupt entry {key} in store {store}: {reason}")]
    StoreCorrupt {
        store: String,
        key: String,
        reason: String,
    },

    // Lifecycle errors
    #[error("Install failed fetching shell path {path}: {reason}")]
    InstallFetch { path: String, reason: String },

    #[error("Shell path {path} returned status {status} during install")]
    InstallStatus { path: String, status: u16 },

    #[error("Reconciliation {activation} failed, all stores were reset: {source}")]
    ReconcileFailed {
        activation: uuid::Uuid,
        #[source]
        source: Box<ShellcacheError>,
    },

    #[error("Prefetch failed for {path}: {reason}")]
    Prefetch { path: String, reason: String },

    // Fetch errors
    #[error("Network fetch failed for {path}: {reason}")]
    Fetch { path: String, reason: String },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ShellcacheError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a network fetch error
    pub fn fetch(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Fetch {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a store write error
    pub fn store_write(
        store: impl Into<String>,
        key: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::StoreWrite {
            store: store.into(),
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error came from the network rather than local storage
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            Self::Fetch { .. } | Self::InstallFetch { .. } | Self::Prefetch { .. }
        )
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::ManifestNotFound(_) => {
                Some("Point manifest_path at the deployment's resource manifest JSON")
            }
            Self::ConfigNotFound(_) => Some("Run with --config or create shellcache.toml"),
            Self::Fetch { .. } | Self::InstallFetch { .. } => {
                Some("Check network connectivity and the configured origin")
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ShellcacheError::ManifestInvalid("missing root alias".to_string());
        assert!(err.to_string().contains("missing root alias"));
    }

    #[test]
    fn error_hint() {
        let err = ShellcacheError::fetch("app.js", "connection refused");
        assert_eq!(
            err.hint(),
            Some("Check network connectivity and the configured origin")
        );
    }

    #[test]
    fn error_is_network() {
        assert!(ShellcacheError::fetch("a", "b").is_network());
        assert!(!ShellcacheError::Internal("x".to_string()).is_network());
    }
}
