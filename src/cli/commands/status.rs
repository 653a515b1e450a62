//! Status command - mirror state against the configured manifest

use crate::cli::commands::build_worker;
use crate::config::Config;
use crate::error::ShellcacheResult;
use crate::store::{CacheStore, DiskStore};
use console::style;
use std::collections::HashSet;

/// Execute the status command
pub async fn execute(config: &Config) -> ShellcacheResult<()> {
    let worker = build_worker(config).await?;
    let store = DiskStore::new(config.mirror_dir());

    let manifest = &worker.config().manifest;
    let cached: HashSet<String> = store
        .keys(&config.stores.content)
        .await?
        .into_iter()
        .collect();
    let cached_count = manifest.paths().filter(|p| cached.contains(*p)).count();

    println!("Mirror:   {}", config.mirror_dir().display());
    println!("Origin:   {}", config.origin);
    println!(
        "Cached:   {} / {} manifest paths",
        style(cached_count).cyan(),
        manifest.len()
    );

    match worker.reconciler().load_previous_manifest().await? {
        Some(previous) if &previous == manifest => {
            println!("Manifest: {} (current deployment applied)", style("✓").green());
        }
        Some(_) => {
            println!(
                "Manifest: {} (previous deployment; run install to update)",
                style("stale").yellow()
            );
        }
        None => {
            println!(
                "Manifest: {} (never installed, or last attempt failed)",
                style("absent").yellow()
            );
        }
    }

    Ok(())
}
