//! Docker image naming for the FoundationDB container.
//!
//! The wrapper only supports images from the official
//! `foundationdb/foundationdb` repository; callers may pin a different tag as
//! long as the repository matches. Compatibility is checked at construction
//! time, before any container is created.

use std::fmt;

use crate::errors::{Error, Result};

#[cfg(test)]
#[path = "image_tests.rs"]
mod tests;

/// The only image repository the wrapper accepts.
pub const DEFAULT_IMAGE_REPOSITORY: &str = "foundationdb/foundationdb";

/// The FoundationDB version used when the caller does not pin one.
pub const DEFAULT_IMAGE_TAG: &str = "7.1.61";

/// A docker image reference split into repository and tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageName {
    repository: String,
    tag: String,
}

impl ImageName {
    /// Creates an image name from an explicit repository and tag.
    pub fn new(repository: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            tag: tag.into(),
        }
    }

    /// Parses a `repository[:tag]` reference, defaulting the tag to `latest`.
    ///
    /// The tag separator is the last `:` that appears after the last `/`, so
    /// registry references with a port (`localhost:5000/fdb`) parse correctly.
    pub fn parse(value: &str) -> Result<Self> {
        let value = value.trim();
        if value.is_empty() {
            return Err(Error::Config("image reference must not be empty".to_string()));
        }

        let slash = value.rfind('/');
        let (repository, tag) = match value.rfind(':') {
            Some(colon) if slash.map_or(true, |s| colon > s) => {
                (&value[..colon], &value[colon + 1..])
            }
            _ => (value, "latest"),
        };

        if repository.is_empty() || tag.is_empty() {
            return Err(Error::Config(format!(
                "invalid image reference '{value}'"
            )));
        }

        Ok(Self::new(repository, tag))
    }

    /// The default FoundationDB image with a specific tag.
    pub fn foundationdb(tag: impl Into<String>) -> Self {
        Self::new(DEFAULT_IMAGE_REPOSITORY, tag)
    }

    /// The image repository.
    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// The image tag.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The full `repository:tag` reference passed to Docker.
    pub fn reference(&self) -> String {
        format!("{}:{}", self.repository, self.tag)
    }

    /// Rejects images from any repository other than `expected`.
    pub(crate) fn assert_compatible_with(&self, expected: &str) -> Result<()> {
        if self.repository == expected {
            Ok(())
        } else {
            Err(Error::IncompatibleImage {
                actual: self.repository.clone(),
                expected: expected.to_string(),
            })
        }
    }
}

impl Default for ImageName {
    fn default() -> Self {
        Self::new(DEFAULT_IMAGE_REPOSITORY, DEFAULT_IMAGE_TAG)
    }
}

impl fmt::Display for ImageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.repository, self.tag)
    }
}
