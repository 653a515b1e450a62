//! Fetch command - route a single GET through the mirror

use crate::cli::args::FetchArgs;
use crate::cli::commands::build_worker;
use crate::config::Config;
use crate::error::ShellcacheResult;
use crate::router::{FetchRequest, ResponseSource, Routed};
use console::style;

/// Execute the fetch command
pub async fn execute(args: FetchArgs, config: &Config) -> ShellcacheResult<()> {
    let worker = build_worker(config).await?;

    let routed = worker
        .router()
        .handle(&FetchRequest::get(&args.url))
        .await?;

    match routed {
        Routed::Bypass => {
            println!(
                "{} Not intercepted (outside manifest); default network handling applies",
                style("→").dim()
            );
        }
        Routed::Response { response, source } => {
            let source = match source {
                ResponseSource::Cache => style("cache").green(),
                ResponseSource::Network => style("network").cyan(),
            };
            println!(
                "{} {} from {} ({} bytes)",
                style("✓").green(),
                response.status,
                source,
                response.body.len()
            );
        }
    }

    Ok(())
}
