//! Command implementations

use std::path::Path;

use anyhow::Result;

use choco_internalize::util::config::{global_config_path, Config};

pub mod completions;
pub mod new;
pub mod pack;
pub mod process;
pub mod push;

/// Load the config file named on the command line, or the global one.
///
/// An explicit path must exist; the global file is optional.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    match explicit {
        Some(path) => Config::load(path),
        None => Ok(global_config_path()
            .map(|path| Config::load_or_default(&path))
            .unwrap_or_default()),
    }
}
