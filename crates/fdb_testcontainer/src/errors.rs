//! Error types for FoundationDB test container operations.
//!
//! This module defines the error types that can occur while provisioning,
//! initializing, and tearing down the disposable FoundationDB cluster. Every
//! startup error is fatal: the container wrapper performs no internal retries,
//! and a failed instance must be discarded by the caller.

use std::time::Duration;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while managing the FoundationDB test container.
///
/// The two initialization variants ([`Error::ProxyInitialization`] and
/// [`Error::DatabaseInitialization`]) carry the offending command and its
/// captured output verbatim, so test failures show exactly what the container
/// reported.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A caller-supplied docker image uses a different repository than
    /// `foundationdb/foundationdb`.
    ///
    /// Only the image tag may be overridden; construction is rejected before
    /// any container is created.
    #[error("incompatible docker image '{actual}': expected an image from the '{expected}' repository")]
    IncompatibleImage {
        /// The repository the caller asked for.
        actual: String,
        /// The only repository this wrapper supports.
        expected: String,
    },

    /// The socat forward command inside the proxy container emitted error
    /// output.
    ///
    /// Raised while wiring the proxy's internal listener to the database
    /// address. The composite container is unusable and must be discarded.
    #[error("failed to bind the proxy port with `{command}`: {output}")]
    ProxyInitialization {
        /// The exec command that was issued inside the proxy container.
        command: String,
        /// The stderr output captured from that command.
        output: String,
    },

    /// An fdbcli probe or configuration command failed.
    ///
    /// This covers a non-zero fdbcli exit code as well as a
    /// `configure new single memory` response that lacks the expected
    /// `Database created` confirmation.
    #[error("database initialization failed for fdbcli command `{command}`: {output}")]
    DatabaseInitialization {
        /// The fdbcli command that was issued.
        command: String,
        /// The captured output, prefixed with the exit code where relevant.
        output: String,
    },

    /// The database container never produced its readiness log line within the
    /// configured bound.
    #[error("container did not log '{pattern}' within {timeout:?}")]
    StartupTimeout {
        /// The log message the readiness wait was looking for.
        pattern: String,
        /// How long the wait was bounded to.
        timeout: Duration,
    },

    /// Pulling the configured image from the registry failed.
    #[error("failed to pull image {image}: {message}")]
    ImagePull {
        /// The full image reference being pulled.
        image: String,
        /// The error message reported by the daemon.
        message: String,
    },

    /// The proxy container has no host port mapped to its internal listen
    /// port.
    #[error("no host port mapped to container port {port}/tcp")]
    PortMapping {
        /// The internal container port that should have been published.
        port: u16,
    },

    /// A Docker daemon request failed.
    #[error("docker operation failed: {0}")]
    Docker(#[from] bollard::errors::Error),

    /// An I/O failure while creating, writing, or deleting the cluster file.
    ///
    /// These are unexpected conditions and are propagated rather than
    /// swallowed.
    #[error("cluster file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// An environment-derived configuration value could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// `start()` was called on a container that is not in the not-started
    /// state.
    #[error("container was already started")]
    AlreadyStarted,

    /// An operation that requires a running container was called before
    /// `start()` completed.
    #[error("container is not started")]
    NotStarted,
}
