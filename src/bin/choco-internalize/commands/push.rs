//! `choco-internalize push` command

use std::path::Path;

use anyhow::{bail, Result};

use crate::cli::PushArgs;
use choco_internalize::ops::push::{push_file, FeedPublisher};

use super::load_config;

pub fn execute(args: PushArgs, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;

    let source = args.source.or(config.push.source).filter(|s| !s.is_empty());
    let Some(source) = source else {
        bail!("required argument missing: --source (or [push] source in config)");
    };
    let api_key = args.api_key.or(config.push.api_key);

    push_file(&FeedPublisher::new(), &args.package, &source, api_key.as_deref())?;
    eprintln!("      Pushed {}", args.package.display());

    Ok(())
}
