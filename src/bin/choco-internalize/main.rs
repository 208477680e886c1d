//! choco-internalize CLI

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("choco_internalize=debug")
    } else {
        EnvFilter::new("choco_internalize=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let config = cli.config.as_deref();
    match cli.command {
        Commands::Process(args) => commands::process::execute(args, config),
        Commands::Pack(args) => commands::pack::execute(args),
        Commands::Push(args) => commands::push::execute(args, config),
        Commands::New(args) => commands::new::execute(args),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
