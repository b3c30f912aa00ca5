//! Command-line interface definitions.

use std::path::PathBuf;

use clap::Parser;

pub mod commands;
pub mod output;

pub use commands::Commands;

#[derive(Parser, Debug)]
#[command(
    name = "thompson",
    version,
    about = "Thompson Sampling bandits: priors, replays and simulations"
)]
pub struct Cli {
    /// Path to a TOML config file (skips the global and project files)
    #[arg(long, global = true, env = "THOMPSON_CONFIG")]
    pub config: Option<PathBuf>,

    /// Emit JSON on stdout instead of human-readable output
    #[arg(long, global = true)]
    pub robot: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all logging
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}
