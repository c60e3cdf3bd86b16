use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "gref",
    about = "Inspect git refspecs and map reference names through them",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Parse a refspec and show its parts
    Parse(ParseArgs),
    /// Test reference names against a single refspec
    Match(MatchArgs),
    /// List the refspecs configured on a remote
    List(ListArgs),
    /// Map reference names through a remote's refspecs (first match wins)
    Map(MapArgs),
}

#[derive(Args)]
pub struct ParseArgs {
    pub spec: String,
    /// Treat the refspec as a push refspec
    #[arg(long)]
    pub push: bool,
}

#[derive(Args)]
pub struct MatchArgs {
    pub spec: String,
    #[arg(required = true)]
    pub refs: Vec<String>,
    #[arg(long)]
    pub push: bool,
}

/// Where remote configuration is read from. Defaults to the git repository
/// containing the current directory.
#[derive(Args)]
pub struct SourceArgs {
    /// Path inside a git repository
    #[arg(long, conflicts_with = "config")]
    pub repo: Option<PathBuf>,
    /// TOML file with `[remotes.<name>]` tables
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Accept a URL in place of a configured remote name
    #[arg(long)]
    pub allow_url: bool,
}

#[derive(Args)]
pub struct ListArgs {
    pub remote: String,
    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Args)]
pub struct MapArgs {
    pub remote: String,
    #[arg(required = true)]
    pub refs: Vec<String>,
    /// Map through push refspecs instead of fetch refspecs
    #[arg(long)]
    pub push: bool,
    #[command(flatten)]
    pub source: SourceArgs,
}
