//! Configuration file support.
//!
//! Settings come from `~/.choco-internalize/config.toml` (or the file given
//! with `--config`) and are overridden by command-line flags:
//!
//! ```toml
//! [feed]
//! url = "https://community.chocolatey.org/api/v2"
//!
//! [mirror]
//! prefix = "https://mirror.local/"
//! notice_after_ms = 1000
//!
//! [push]
//! source = "https://nexus.local/repository/choco/"
//! api_key = "..."
//!
//! [run]
//! keep_temp = false
//! strict = false
//! output_dir = "./out"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::util::fs::read_to_string;

/// Public feed queried when none is configured.
pub const DEFAULT_FEED_URL: &str = "https://community.chocolatey.org/api/v2";

/// How long a mirror probe may run before a notice is logged.
pub const DEFAULT_NOTICE_AFTER: Duration = Duration::from_secs(1);

/// Tool configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Upstream feed settings
    pub feed: FeedConfig,

    /// Internal mirror settings
    pub mirror: MirrorConfig,

    /// Private feed settings
    pub push: PushConfig,

    /// Per-run behavior
    pub run: RunConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// OData base URL of the upstream repository
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    /// Base URL under which internalized payloads are served
    pub prefix: Option<String>,

    /// Milliseconds before a slow probe is reported
    pub notice_after_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PushConfig {
    /// Publish the repacked archive
    pub enabled: bool,

    /// Destination feed URL
    pub source: Option<String>,

    /// Value for the `X-NuGet-ApiKey` header
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Keep temporary directories after the run
    pub keep_temp: bool,

    /// Fail when any download cache entry could not be internalized
    pub strict: bool,

    /// Where to place the repacked archive (default: a temp dir)
    pub output_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = read_to_string(path)?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.feed.url.is_some() {
            self.feed.url = other.feed.url;
        }

        if other.mirror.prefix.is_some() {
            self.mirror.prefix = other.mirror.prefix;
        }
        if other.mirror.notice_after_ms.is_some() {
            self.mirror.notice_after_ms = other.mirror.notice_after_ms;
        }

        if other.push.enabled {
            self.push.enabled = true;
        }
        if other.push.source.is_some() {
            self.push.source = other.push.source;
        }
        if other.push.api_key.is_some() {
            self.push.api_key = other.push.api_key;
        }

        if other.run.keep_temp {
            self.run.keep_temp = true;
        }
        if other.run.strict {
            self.run.strict = true;
        }
        if other.run.output_dir.is_some() {
            self.run.output_dir = other.run.output_dir;
        }
    }

    pub fn feed_url(&self) -> &str {
        self.feed.url.as_deref().unwrap_or(DEFAULT_FEED_URL)
    }

    pub fn mirror_prefix(&self) -> Option<&str> {
        self.mirror.prefix.as_deref().filter(|p| !p.is_empty())
    }

    pub fn notice_after(&self) -> Duration {
        self.mirror
            .notice_after_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_NOTICE_AFTER)
    }

    /// Check the settings a packaging run depends on.
    pub fn validate(&self) -> Result<()> {
        let Some(prefix) = self.mirror_prefix() else {
            bail!("required argument missing: mirror prefix (--proxy-prefix or [mirror] prefix)");
        };
        Url::parse(prefix).with_context(|| format!("invalid mirror prefix: {}", prefix))?;

        let feed = self.feed_url();
        Url::parse(feed).with_context(|| format!("invalid feed url: {}", feed))?;

        if self.push.enabled {
            match self.push.source.as_deref() {
                Some(source) if !source.is_empty() => {
                    Url::parse(source)
                        .with_context(|| format!("invalid push source: {}", source))?;
                }
                _ => bail!("required push argument missing: push source"),
            }
        }

        Ok(())
    }
}

/// Get the global config directory (~/.choco-internalize).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".choco-internalize"))
}

/// Get the global config path (~/.choco-internalize/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}
