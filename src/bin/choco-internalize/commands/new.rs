//! `choco-internalize new` command

use anyhow::Result;

use crate::cli::NewArgs;
use choco_internalize::ops::new_package::{new_package, NewOptions};

/// Name recorded as author when `--user` is not given.
pub fn default_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "Author".to_string())
}

pub fn execute(args: NewArgs) -> Result<()> {
    let opts = NewOptions {
        id: args.id,
        user: args.user.unwrap_or_else(default_user),
        force: args.force,
    };

    let path = new_package(&args.path, &opts)?;
    eprintln!("     Created {}", path.display());

    Ok(())
}
