//! `choco-internalize process` command

use std::path::Path;

use anyhow::Result;

use crate::cli::ProcessArgs;
use choco_internalize::ops::process::{process_package, Collaborators, ProcessOptions};
use choco_internalize::ops::push::FeedPublisher;
use choco_internalize::sources::feed::ODataFeed;
use choco_internalize::sources::mirror::MirrorValidator;
use choco_internalize::util::config::{Config, FeedConfig, MirrorConfig, PushConfig, RunConfig};
use choco_internalize::util::ids::RandomIds;

use super::load_config;

/// Command-line values as a config layer that overrides the file.
pub fn cli_overrides(args: &ProcessArgs) -> Config {
    Config {
        feed: FeedConfig {
            url: args.feed.clone(),
        },
        mirror: MirrorConfig {
            prefix: args.proxy_prefix.clone(),
            notice_after_ms: None,
        },
        push: PushConfig {
            enabled: args.push,
            source: args.push_source.clone(),
            api_key: args.push_api_key.clone(),
        },
        run: RunConfig {
            keep_temp: args.keep_temp,
            strict: args.strict,
            output_dir: args.output.clone(),
        },
    }
}

pub fn execute(args: ProcessArgs, config_path: Option<&Path>) -> Result<()> {
    let mut config = load_config(config_path)?;
    config.merge(cli_overrides(&args));

    let mut opts = ProcessOptions::from_config(&config)?;
    if let Some(report) = &args.report {
        opts = opts.with_report(report);
    }

    let feed = ODataFeed::new(config.feed_url());
    let mirror = MirrorValidator::http().with_notice_after(config.notice_after());
    let publisher = FeedPublisher::new();
    let with = Collaborators {
        feed: &feed,
        mirror: &mirror,
        ids: &RandomIds,
        publisher: &publisher,
    };

    let outcome = process_package(&opts, &with, &args.id, &args.version)?;

    if outcome.retained {
        eprintln!("    Packaged {}", outcome.package.display());
    }
    if outcome.pushed {
        eprintln!("      Pushed {}", outcome.metadata);
    }

    Ok(())
}
