//! Disposable single-node FoundationDB clusters for integration tests.
//!
//! This crate provisions a FoundationDB server inside Docker, fronted by a
//! socat proxy that resolves FoundationDB's circular port requirement: the
//! server must bind the same port external clients dial, but that port is only
//! known after Docker assigns the proxy's host mapping. Startup therefore runs
//! a strict three-phase protocol (proxy first, then server, then the forward
//! rule), after which a connection string and cluster file are available to
//! test code.
//!
//! Uses `foundationdb/foundationdb:7.1.61` by default; any other tag from the
//! same repository may be pinned via [`ContainerConfig`]. The FoundationDB
//! client API version must be aligned with the server version in use.

pub mod config;
pub mod container;
pub mod errors;
pub mod image;

pub(crate) mod cluster_file;
pub(crate) mod docker;
pub(crate) mod proxy;

// Re-export commonly used types for convenience
pub use config::ContainerConfig;
pub use container::{ContainerState, FoundationDbContainer};
pub use errors::{Error, Result};
pub use image::ImageName;
