//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// Repackage community Chocolatey packages with internalized downloads
#[derive(Parser)]
#[command(name = "choco-internalize")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file (defaults to ~/.choco-internalize/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch, internalize, repack and optionally push a package
    Process(ProcessArgs),

    /// Pack a local package directory into a .nupkg
    Pack(PackArgs),

    /// Push an existing .nupkg to a feed
    Push(PushArgs),

    /// Write a sample .nuspec
    New(NewArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct ProcessArgs {
    /// Package id on the upstream feed
    #[arg(long)]
    pub id: String,

    /// Package version
    #[arg(long = "ver", value_name = "VERSION")]
    pub version: String,

    /// Mirror URL prefix that download URLs are rewritten to
    #[arg(long, value_name = "URL")]
    pub proxy_prefix: Option<String>,

    /// Push the repacked package
    #[arg(long)]
    pub push: bool,

    /// Feed to push to
    #[arg(long, value_name = "URL")]
    pub push_source: Option<String>,

    /// API key for the push feed
    #[arg(long = "push-apikey", env = "CHOCO_PUSH_API_KEY", hide_env_values = true)]
    pub push_api_key: Option<String>,

    /// Keep temporary directories
    #[arg(long)]
    pub keep_temp: bool,

    /// Fail if any download could not be internalized
    #[arg(long)]
    pub strict: bool,

    /// Directory for the repacked package
    #[arg(long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Write the internalization report as JSON
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Upstream OData feed URL
    #[arg(long, value_name = "URL")]
    pub feed: Option<String>,
}

#[derive(Args)]
pub struct PackArgs {
    /// Package directory
    #[arg(default_value = ".")]
    pub dir: PathBuf,

    /// Manifest to pack (defaults to the only .nuspec in DIR)
    #[arg(long, value_name = "PATH")]
    pub nuspec: Option<PathBuf>,

    /// Output file (defaults to <id>.<version>.nupkg in the current directory)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct PushArgs {
    /// Package archive to push
    pub package: PathBuf,

    /// Feed to push to
    #[arg(long, value_name = "URL")]
    pub source: Option<String>,

    /// API key for the feed
    #[arg(long, env = "CHOCO_PUSH_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
}

#[derive(Args)]
pub struct NewArgs {
    /// Package id
    pub id: Option<String>,

    /// Author and owner name
    #[arg(long)]
    pub user: Option<String>,

    /// Directory to write the manifest in
    #[arg(long, default_value = ".")]
    pub path: PathBuf,

    /// Overwrite an existing manifest
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
