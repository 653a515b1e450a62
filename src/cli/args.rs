//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// shellcache - Offline mirror for content-hashed static web apps
///
/// Maintains a local cache of a deployed application's assets, reusing
/// unchanged files across versions and updating incrementally from the
/// deployment's resource manifest.
#[derive(Parser, Debug)]
#[command(name = "shellcache")]
#[command(author, version, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "SHELLCACHE_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a full update cycle: stage the shell, then reconcile the mirror
    Install,

    /// Show mirror state against the configured manifest
    Status,

    /// Fetch every manifest path not yet mirrored
    Prefetch,

    /// Route a single GET through the mirror and report the source
    Fetch(FetchArgs),
}

/// Arguments for the fetch command
#[derive(Parser, Debug)]
pub struct FetchArgs {
    /// Request URL (absolute, under the configured origin)
    pub url: String,
}
