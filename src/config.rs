//! Configuration for the offline-mirror binary
//!
//! Stored as `shellcache.toml`. The library itself takes its configuration
//! as constructed values; this module only serves the CLI.

use crate::error::{ShellcacheError, ShellcacheResult};
use crate::manifest::{ResourceManifest, ShellSet};
use crate::store::StoreNames;
use crate::worker::WorkerConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Origin the deployment is served from (scheme + host)
    pub origin: String,

    /// Path to the deployment's resource manifest JSON
    pub manifest_path: PathBuf,

    /// Shell paths fetched fresh during install, in order
    #[serde(default)]
    pub shell: Vec<String>,

    /// Where the mirror's stores live; defaults under the user data dir
    #[serde(default)]
    pub mirror_dir: Option<PathBuf>,

    /// Store names; must stay stable across deployments
    #[serde(default)]
    pub stores: StoreNames,
}

impl Config {
    /// Parse a config from a TOML string
    pub fn parse(content: &str) -> ShellcacheResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Resolved mirror directory
    pub fn mirror_dir(&self) -> PathBuf {
        self.mirror_dir
            .clone()
            .unwrap_or_else(ConfigManager::default_mirror_dir)
    }

    /// Load the manifest file and assemble the worker configuration
    pub async fn worker_config(&self) -> ShellcacheResult<WorkerConfig> {
        let manifest = ResourceManifest::from_file(&self.manifest_path).await?;
        let shell = ShellSet::new(self.shell.clone());
        manifest.validate(&shell)?;

        Ok(WorkerConfig {
            manifest,
            shell,
            origin: self.origin.clone(),
            store_names: self.stores.clone(),
        })
    }
}

/// Locates and loads the CLI configuration
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Config manager with the default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("shellcache")
            .join("shellcache.toml")
    }

    /// Default mirror directory
    pub fn default_mirror_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("shellcache")
            .join("mirror")
    }

    /// Path this manager reads from
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load the configuration file
    pub async fn load(&self) -> ShellcacheResult<Config> {
        if !self.config_path.exists() {
            return Err(ShellcacheError::ConfigNotFound(self.config_path.clone()));
        }

        debug!(path = %self.config_path.display(), "loading config");
        let content = fs::read_to_string(&self.config_path).await.map_err(|e| {
            ShellcacheError::io(
                format!("reading config from {}", self.config_path.display()),
                e,
            )
        })?;

        Config::parse(&content).map_err(|e| ShellcacheError::ConfigInvalid {
            path: self.config_path.clone(),
            reason: e.to_string(),
        })
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
origin = "https://app.example.com"
manifest_path = "/srv/app/manifest.json"
shell = ["index.html", "app.js"]
mirror_dir = "/var/lib/shellcache"

[stores]
manifest = "acme-manifest"
staging = "acme-temp"
content = "acme-content"
"#;

    #[test]
    fn parse_full_config() {
        let config = Config::parse(FULL).unwrap();
        assert_eq!(config.origin, "https://app.example.com");
        assert_eq!(config.shell, vec!["index.html", "app.js"]);
        assert_eq!(config.mirror_dir(), PathBuf::from("/var/lib/shellcache"));
        assert_eq!(config.stores.content, "acme-content");
    }

    #[test]
    fn parse_minimal_config_uses_defaults() {
        let config = Config::parse(
            r#"
origin = "https://app.example.com"
manifest_path = "manifest.json"
"#,
        )
        .unwrap();
        assert!(config.shell.is_empty());
        assert_eq!(config.stores, StoreNames::default());
        assert!(config.mirror_dir().ends_with("shellcache/mirror"));
    }

    #[test]
    fn parse_rejects_missing_origin() {
        assert!(Config::parse(r#"manifest_path = "manifest.json""#).is_err());
    }

    #[tokio::test]
    async fn load_missing_file_errors() {
        let manager = ConfigManager::with_path(PathBuf::from("/nonexistent/shellcache.toml"));
        let err = manager.load().await.unwrap_err();
        assert!(matches!(err, ShellcacheError::ConfigNotFound(_)));
    }

    #[tokio::test]
    async fn load_from_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("shellcache.toml");
        tokio::fs::write(&path, FULL).await.unwrap();

        let config = ConfigManager::with_path(path).load().await.unwrap();
        assert_eq!(config.origin, "https://app.example.com");
    }

    #[tokio::test]
    async fn worker_config_validates_shell_against_manifest() {
        let dir = tempfile::TempDir::new().unwrap();
        let manifest_path = dir.path().join("manifest.json");
        tokio::fs::write(&manifest_path, r#"{"/": "h0", "index.html": "h0"}"#)
            .await
            .unwrap();

        let config = Config {
            origin: "https://app.example.com".to_string(),
            manifest_path,
            shell: vec!["missing.js".to_string()],
            mirror_dir: None,
            stores: StoreNames::default(),
        };

        let err = config.worker_config().await.unwrap_err();
        assert!(matches!(err, ShellcacheError::ShellPathUnknown(_)));
    }
}
