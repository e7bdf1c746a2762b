//! CLI argument definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// hash-history: keep application locations in the URL hash fragment
#[derive(Parser, Debug)]
#[command(name = "hash-history")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Decode a hash into a location
    Inspect(InspectArgs),

    /// Run a scripted navigation session against an in-memory address bar
    Simulate(SimulateArgs),

    /// Configuration management
    Config(ConfigArgs),
}

/// Overrides for the embedded state-key parameter
#[derive(Args, Debug, Default)]
pub struct QueryKeyArgs {
    /// Query parameter carrying the state key
    #[arg(long, conflicts_with = "no_query_key")]
    pub query_key: Option<String>,

    /// Disable keyed state entirely
    #[arg(long)]
    pub no_query_key: bool,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Hash to decode (leading `#` optional)
    pub hash: String,

    #[command(flatten)]
    pub query_key: QueryKeyArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// TOML script describing the navigation steps
    #[arg(long)]
    pub script: PathBuf,

    #[command(flatten)]
    pub query_key: QueryKeyArgs,

    /// Override the keyed state file (implies the file backend)
    #[arg(long)]
    pub state_file: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Init {
        /// Path to write config file
        #[arg(long, default_value = "./hash-history.toml")]
        path: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}
