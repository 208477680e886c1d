//! Internal mirror addressing and reachability checks.
//!
//! The mirror serves each upstream payload under its scheme-stripped URL:
//! `https://host/a.zip` is served at `<prefix>https/host/a.zip`.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::core::errors::PackageError;
use crate::util::config::DEFAULT_NOTICE_AFTER;

/// Builds internal mirror URLs from upstream ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorPrefix {
    prefix: String,
}

impl MirrorPrefix {
    pub fn new(prefix: impl Into<String>) -> Self {
        MirrorPrefix {
            prefix: prefix.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.prefix
    }

    /// Mirror URL for an upstream download URL.
    pub fn target_for(&self, url: &str) -> String {
        let stripped = if let Some(rest) = url.strip_prefix("https://") {
            format!("https/{}", rest)
        } else if let Some(rest) = url.strip_prefix("http://") {
            format!("http/{}", rest)
        } else {
            url.to_string()
        };
        format!("{}{}", self.prefix, stripped)
    }
}

/// A single reachability attempt.
pub trait Probe: Send + Sync {
    fn probe(&self, url: &str) -> Result<(), PackageError>;
}

/// Probe with an HTTP GET; only `200 OK` counts as reachable.
pub struct HttpProbe {
    client: reqwest::blocking::Client,
}

impl HttpProbe {
    pub fn new() -> Self {
        HttpProbe {
            client: reqwest::blocking::Client::new(),
        }
    }
}

impl Default for HttpProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl Probe for HttpProbe {
    fn probe(&self, url: &str) -> Result<(), PackageError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| PackageError::UnreachableMirror {
                url: url.to_string(),
                reason: format!("request failed: {}", e),
            })?;

        if response.status() != reqwest::StatusCode::OK {
            return Err(PackageError::UnreachableMirror {
                url: url.to_string(),
                reason: format!("HTTP {}", response.status()),
            });
        }
        Ok(())
    }
}

/// Validates that a mirror URL is being served.
pub trait MirrorCheck {
    fn validate(&self, url: &str) -> Result<(), PackageError>;
}

/// Runs a probe on its own thread and waits for its result.
///
/// If the probe is still running after `notice_after`, a notice is logged and
/// the wait continues. The probe is never cancelled; the caller always gets
/// its real outcome.
pub struct MirrorValidator {
    probe: Arc<dyn Probe>,
    notice_after: Duration,
}

impl MirrorValidator {
    pub fn new(probe: Arc<dyn Probe>) -> Self {
        MirrorValidator {
            probe,
            notice_after: DEFAULT_NOTICE_AFTER,
        }
    }

    /// Validator backed by [`HttpProbe`].
    pub fn http() -> Self {
        Self::new(Arc::new(HttpProbe::new()))
    }

    pub fn with_notice_after(mut self, notice_after: Duration) -> Self {
        self.notice_after = notice_after;
        self
    }
}

impl MirrorCheck for MirrorValidator {
    fn validate(&self, url: &str) -> Result<(), PackageError> {
        let (tx, rx) = mpsc::channel();
        let probe = Arc::clone(&self.probe);
        let target = url.to_string();

        thread::spawn(move || {
            // The receiver only goes away if the caller is gone too.
            let _ = tx.send(probe.probe(&target));
        });

        let terminated = || PackageError::UnreachableMirror {
            url: url.to_string(),
            reason: "probe terminated".to_string(),
        };

        match rx.recv_timeout(self.notice_after) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                tracing::info!("Validating download cache {}", url);
                rx.recv().unwrap_or_else(|_| Err(terminated()))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(terminated()),
        }
    }
}
