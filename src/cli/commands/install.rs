//! Install command - stage the shell, then reconcile the mirror

use crate::cli::commands::build_worker;
use crate::config::Config;
use crate::error::ShellcacheResult;
use crate::reconcile::ReconcileOutcome;
use crate::worker::EventOutcome;
use console::style;

/// Execute the install command
pub async fn execute(config: &Config) -> ShellcacheResult<()> {
    let worker = build_worker(config).await?;

    println!(
        "Staging {} shell path(s) from {}...",
        worker.config().shell.len(),
        style(&config.origin).cyan()
    );
    worker.handle_install().await?;

    let outcome = worker.handle_activate().await?;
    match outcome {
        EventOutcome::Activated(ReconcileOutcome::FreshInstall { promoted }) => {
            println!(
                "{} Fresh install: {} entr{} promoted",
                style("✓").green(),
                promoted,
                if promoted == 1 { "y" } else { "ies" }
            );
        }
        EventOutcome::Activated(ReconcileOutcome::Upgraded {
            reused,
            deleted,
            promoted,
        }) => {
            println!(
                "{} Upgraded: {} reused, {} pruned, {} promoted",
                style("✓").green(),
                reused,
                deleted,
                promoted
            );
        }
        _ => {}
    }

    Ok(())
}
