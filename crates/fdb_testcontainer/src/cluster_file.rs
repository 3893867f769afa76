//! The cluster file artifact handed to FoundationDB clients.
//!
//! A cluster file is a plain text file containing exactly the connection
//! string bytes. At most one exists per container instance; its path is stable
//! once created, and it is deleted when the container stops.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::errors::Result;

#[cfg(test)]
#[path = "cluster_file_tests.rs"]
mod tests;

/// A lazily created temp file holding the cluster connection string.
#[derive(Debug)]
pub(crate) struct ClusterFile {
    file: NamedTempFile,
}

impl ClusterFile {
    /// Writes `connection_string` to a fresh `fdb_*.cluster` temp file.
    pub(crate) fn create(connection_string: &str) -> Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("fdb_")
            .suffix(".cluster")
            .tempfile()?;

        file.write_all(connection_string.as_bytes())?;
        file.flush()?;

        debug!("using cluster file {}", file.path().display());
        Ok(Self { file })
    }

    /// The stable path of the cluster file.
    pub(crate) fn path(&self) -> &Path {
        self.file.path()
    }

    /// Deletes the file from disk.
    pub(crate) fn delete(self) -> Result<()> {
        self.file.close()?;
        Ok(())
    }
}
