//! Prefetch command - full offline-readiness sweep

use crate::cli::commands::build_worker;
use crate::config::Config;
use crate::error::ShellcacheResult;
use console::style;

/// Execute the prefetch command
pub async fn execute(config: &Config) -> ShellcacheResult<()> {
    let worker = build_worker(config).await?;

    let fetched = worker.prefetch_missing().await?;
    if fetched == 0 {
        println!("{} Mirror already complete", style("✓").green());
    } else {
        println!(
            "{} Fetched {} missing entr{}",
            style("✓").green(),
            fetched,
            if fetched == 1 { "y" } else { "ies" }
        );
    }

    Ok(())
}
