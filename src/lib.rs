//! shellcache - Offline cache controller
//!
//! Keeps a content-hashed static web application runnable offline and
//! updates it incrementally: install stages the application shell, activate
//! reconciles the content cache against the manifest diff, and the fetch
//! path serves cache-first for assets and online-first for the root
//! document.

pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod manifest;
pub mod reconcile;
pub mod router;
pub mod store;
pub mod worker;

pub use error::{ShellcacheError, ShellcacheResult};
