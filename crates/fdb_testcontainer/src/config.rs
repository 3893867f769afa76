//! Configuration for the FoundationDB test container.

use std::env;
use std::time::Duration;

use crate::errors::{Error, Result};
use crate::image::ImageName;

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

/// How long the database container may take to log its readiness line.
pub const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_secs(60);

/// Configuration for a [`FoundationDbContainer`](crate::FoundationDbContainer).
#[derive(Debug, Clone)]
pub struct ContainerConfig {
    /// The FoundationDB docker image to run.
    pub image: ImageName,

    /// Whether an already-initialized database should be reused.
    ///
    /// With reuse enabled, startup probes `status minimal` first and skips the
    /// `configure new` step when the database reports available. Without it,
    /// every start configures a new single in-memory database.
    pub reuse: bool,

    /// Bound on the wait for the `FDBD joined cluster` log line.
    pub startup_timeout: Duration,
}

impl ContainerConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset.
    ///
    /// Recognized variables:
    /// - `FDB_TEST_IMAGE_TAG`: tag of the `foundationdb/foundationdb` image
    /// - `FDB_TEST_REUSE`: `true`/`false`
    /// - `FDB_TEST_STARTUP_TIMEOUT_SECS`: whole seconds
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(tag) = env::var("FDB_TEST_IMAGE_TAG") {
            config.image = ImageName::foundationdb(tag);
        }

        if let Ok(reuse) = env::var("FDB_TEST_REUSE") {
            config.reuse = reuse.parse().map_err(|_| {
                Error::Config(format!(
                    "FDB_TEST_REUSE must be 'true' or 'false', got '{reuse}'"
                ))
            })?;
        }

        if let Ok(secs) = env::var("FDB_TEST_STARTUP_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().map_err(|_| {
                Error::Config(format!(
                    "FDB_TEST_STARTUP_TIMEOUT_SECS must be a number of seconds, got '{secs}'"
                ))
            })?;
            config.startup_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Use a specific tag of the default FoundationDB repository.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.image = ImageName::foundationdb(tag);
        self
    }

    /// Enable or disable reuse of an already-initialized database.
    pub fn with_reuse(mut self, reuse: bool) -> Self {
        self.reuse = reuse;
        self
    }

    /// Override the readiness wait bound.
    pub fn with_startup_timeout(mut self, timeout: Duration) -> Self {
        self.startup_timeout = timeout;
        self
    }
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            image: ImageName::default(),
            reuse: false,
            startup_timeout: DEFAULT_STARTUP_TIMEOUT,
        }
    }
}
