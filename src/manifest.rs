//! Resource manifest and request-path normalization
//!
//! A manifest maps normalized asset paths to opaque content fingerprints for
//! one deployed version. It is embedded in the deployment as JSON and is the
//! sole source of truth for desired cache state. Fingerprints are never
//! recomputed from cached bytes; they are trusted as supplied.

use crate::error::{ShellcacheError, ShellcacheResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// The logical path served for the bare origin, fragment-only navigations,
/// and the empty path. Must mirror the canonical index entry's fingerprint.
pub const ROOT_ALIAS: &str = "/";

/// Canonical index path the root alias mirrors, when present.
const INDEX_PATH: &str = "index.html";

/// Mapping from normalized path to content fingerprint for one deployment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceManifest {
    entries: HashMap<String, String>,
}

impl ResourceManifest {
    /// Build a manifest from (path, fingerprint) pairs
    pub fn from_entries<I, P, F>(entries: I) -> Self
    where
        I: IntoIterator<Item = (P, F)>,
        P: Into<String>,
        F: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(p, f)| (p.into(), f.into()))
                .collect(),
        }
    }

    /// Parse a manifest from its JSON form
    pub fn parse(json: &str) -> ShellcacheResult<Self> {
        serde_json::from_str(json).map_err(|e| ShellcacheError::ManifestInvalid(e.to_string()))
    }

    /// Load a manifest from a JSON file on disk
    pub async fn from_file(path: &Path) -> ShellcacheResult<Self> {
        if !path.exists() {
            return Err(ShellcacheError::ManifestNotFound(path.to_path_buf()));
        }
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ShellcacheError::io(format!("reading manifest {}", path.display()), e))?;
        Self::parse(&content)
    }

    /// Serialize to JSON (the persisted-record wire form)
    pub fn to_json(&self) -> ShellcacheResult<String> {
        Ok(serde_json::to_string(&self.entries)?)
    }

    /// Fingerprint for a path, if the path is part of this deployment
    pub fn fingerprint(&self, path: &str) -> Option<&str> {
        self.entries.get(path).map(String::as_str)
    }

    /// Whether a path is part of this deployment
    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// All paths in this deployment (order is not significant)
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the manifest has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Validate structural invariants against the shell set:
    /// the root alias must exist, must mirror the index entry when one is
    /// present, and every shell path must be a manifest key.
    pub fn validate(&self, shell: &ShellSet) -> ShellcacheResult<()> {
        let root = self.fingerprint(ROOT_ALIAS).ok_or_else(|| {
            ShellcacheError::ManifestInvalid(format!("missing root alias entry \"{ROOT_ALIAS}\""))
        })?;

        if let Some(index) = self.fingerprint(INDEX_PATH) {
            if index != root {
                return Err(ShellcacheError::ManifestInvalid(format!(
                    "root alias fingerprint {root} does not match {INDEX_PATH} ({index})"
                )));
            }
        }

        for path in shell.paths() {
            if !self.contains(path) {
                return Err(ShellcacheError::ShellPathUnknown(path.to_string()));
            }
        }

        Ok(())
    }
}

/// Ordered set of paths that must be fetched fresh before the application
/// counts as installed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShellSet {
    paths: Vec<String>,
}

impl ShellSet {
    /// Build a shell set from an ordered list of paths
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    /// Shell paths in install order
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }

    /// Number of shell paths
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether the shell set is empty
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Normalize a request URL to a manifest path.
///
/// Returns `None` when the URL is not under `origin` (the request is not
/// ours to answer). Otherwise strips the origin prefix, drops a trailing
/// `?v=` cache-busting token, and maps the bare origin, fragment-only
/// navigations (`origin/#...`) and the empty path to [`ROOT_ALIAS`].
pub fn normalize_request_path(url: &str, origin: &str) -> Option<String> {
    let origin = origin.trim_end_matches('/');

    if url == origin {
        return Some(ROOT_ALIAS.to_string());
    }

    let rest = url.strip_prefix(origin)?;
    let key = rest.strip_prefix('/')?;

    if key.starts_with('#') {
        return Some(ROOT_ALIAS.to_string());
    }

    let key = match key.split_once("?v=") {
        Some((bare, _)) => bare,
        None => key,
    };

    if key.is_empty() {
        return Some(ROOT_ALIAS.to_string());
    }

    Some(key.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: &str = "https://app.example.com";

    fn manifest() -> ResourceManifest {
        ResourceManifest::from_entries([
            ("/", "h0"),
            ("index.html", "h0"),
            ("app.js", "h1"),
            ("assets/logo.png", "h2"),
        ])
    }

    #[test]
    fn parse_manifest_json() {
        let m = ResourceManifest::parse(r#"{"app.js": "abc123", "/": "def456"}"#).unwrap();
        assert_eq!(m.fingerprint("app.js"), Some("abc123"));
        assert_eq!(m.len(), 2);
    }

    #[test]
    fn parse_rejects_non_object() {
        assert!(ResourceManifest::parse("[1, 2]").is_err());
    }

    #[test]
    fn manifest_roundtrips_through_json() {
        let m = manifest();
        let back = ResourceManifest::parse(&m.to_json().unwrap()).unwrap();
        assert_eq!(back, m);
    }

    #[test]
    fn validate_accepts_consistent_manifest() {
        let shell = ShellSet::new(["app.js", "index.html"]);
        assert!(manifest().validate(&shell).is_ok());
    }

    #[test]
    fn validate_requires_root_alias() {
        let m = ResourceManifest::from_entries([("app.js", "h1")]);
        let err = m.validate(&ShellSet::default()).unwrap_err();
        assert!(err.to_string().contains("root alias"));
    }

    #[test]
    fn validate_requires_root_matches_index() {
        let m = ResourceManifest::from_entries([("/", "h0"), ("index.html", "different")]);
        assert!(m.validate(&ShellSet::default()).is_err());
    }

    #[test]
    fn validate_rejects_shell_path_outside_manifest() {
        let shell = ShellSet::new(["missing.js"]);
        let err = manifest().validate(&shell).unwrap_err();
        assert!(matches!(err, ShellcacheError::ShellPathUnknown(_)));
    }

    #[test]
    fn normalize_plain_path() {
        assert_eq!(
            normalize_request_path(&format!("{ORIGIN}/app.js"), ORIGIN),
            Some("app.js".to_string())
        );
    }

    #[test]
    fn normalize_strips_version_token() {
        assert_eq!(
            normalize_request_path(&format!("{ORIGIN}/app.js?v=5"), ORIGIN),
            Some("app.js".to_string())
        );
    }

    #[test]
    fn normalize_bare_origin_is_root() {
        assert_eq!(
            normalize_request_path(ORIGIN, ORIGIN),
            Some(ROOT_ALIAS.to_string())
        );
        assert_eq!(
            normalize_request_path(&format!("{ORIGIN}/"), ORIGIN),
            Some(ROOT_ALIAS.to_string())
        );
    }

    #[test]
    fn normalize_fragment_navigation_is_root() {
        assert_eq!(
            normalize_request_path(&format!("{ORIGIN}/#/settings"), ORIGIN),
            Some(ROOT_ALIAS.to_string())
        );
    }

    #[test]
    fn normalize_foreign_origin_is_none() {
        assert_eq!(
            normalize_request_path("https://other.example.com/app.js", ORIGIN),
            None
        );
    }

    #[test]
    fn normalize_nested_path() {
        assert_eq!(
            normalize_request_path(&format!("{ORIGIN}/assets/logo.png"), ORIGIN),
            Some("assets/logo.png".to_string())
        );
    }

    #[test]
    fn normalize_trailing_slash_origin_config() {
        // Tolerate a configured origin that carries a trailing slash
        assert_eq!(
            normalize_request_path(&format!("{ORIGIN}/app.js"), "https://app.example.com/"),
            Some("app.js".to_string())
        );
    }
}
