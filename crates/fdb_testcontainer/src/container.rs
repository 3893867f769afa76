//! Database lifecycle manager for the disposable FoundationDB cluster.
//!
//! [`FoundationDbContainer`] composes two containers on a private network: the
//! FoundationDB server and a socat proxy that fronts it. Startup is a strict
//! three-phase protocol (see [`FoundationDbContainer::start`]); collapsing the
//! phases reintroduces the port-mismatch crash the proxy exists to avoid,
//! because the server asserts that the port a peer dialed matches the port it
//! bound.

use std::path::PathBuf;

use bollard::container::Config;
use bollard::service::HostConfig;
use bollard::Docker;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cluster_file::ClusterFile;
use crate::config::ContainerConfig;
use crate::docker;
use crate::errors::{Error, Result};
use crate::image::DEFAULT_IMAGE_REPOSITORY;
use crate::proxy::SocatProxy;

#[cfg(test)]
#[path = "container_tests.rs"]
mod tests;

/// The port FoundationDB exposes through the proxy inside the private network.
const INTERNAL_PORT: u16 = 4500;

/// Path of the command-line client bundled with the server image.
const FDBCLI: &str = "/usr/bin/fdbcli";

/// Log line that signals the server has joined its cluster.
const READY_LOG_MESSAGE: &str = "FDBD joined cluster";

/// fdbcli output confirming an existing database is usable.
const DATABASE_AVAILABLE: &str = "The database is available";

/// fdbcli output confirming `configure new` succeeded.
const DATABASE_CREATED: &str = "Database created";

/// Lifecycle states of the composite container.
///
/// Database initialization runs only on the transition into
/// [`ContainerState::Started`]; cluster-file removal runs on the transition
/// into [`ContainerState::Stopping`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerState {
    NotStarted,
    Starting,
    Started,
    Stopping,
    Stopped,
}

/// A disposable single-node in-memory FoundationDB cluster for integration
/// tests.
///
/// # Example
///
/// ```rust,ignore
/// use fdb_testcontainer::FoundationDbContainer;
///
/// let mut container = FoundationDbContainer::new()?;
/// container.start().await?;
///
/// let cluster_file = container.cluster_file_path()?;
/// // hand cluster_file to an FDB client...
///
/// container.stop().await?;
/// ```
#[derive(Debug)]
pub struct FoundationDbContainer {
    docker: Docker,
    config: ContainerConfig,
    host: String,
    network_name: String,
    /// Also the DNS name the proxy forwards to on the private network.
    container_name: String,
    state: ContainerState,
    container_id: Option<String>,
    network_created: bool,
    proxy: Option<SocatProxy>,
    bind_port: Option<u16>,
    cluster_file: Option<ClusterFile>,
}

impl FoundationDbContainer {
    /// Creates a container wrapper with the default image
    /// (`foundationdb/foundationdb:7.1.61`).
    pub fn new() -> Result<Self> {
        Self::with_config(ContainerConfig::default())
    }

    /// Creates a container wrapper from an explicit configuration.
    ///
    /// Rejects images outside the `foundationdb/foundationdb` repository
    /// before any container is created.
    pub fn with_config(config: ContainerConfig) -> Result<Self> {
        config.image.assert_compatible_with(DEFAULT_IMAGE_REPOSITORY)?;

        let suffix = Uuid::new_v4();
        Ok(Self {
            docker: docker::connect()?,
            config,
            host: docker::docker_host(),
            network_name: format!("testcontainers-fdb-net-{suffix}"),
            container_name: format!("testcontainers-fdb-{suffix}"),
            state: ContainerState::NotStarted,
            container_id: None,
            network_created: false,
            proxy: None,
            bind_port: None,
            cluster_file: None,
        })
    }

    /// Brings up the proxy and database containers and initializes the
    /// database.
    ///
    /// The three phases must run in exactly this order:
    /// 1. start the proxy to learn the host-assigned bind port;
    /// 2. start the server with `FDB_PORT` set to that port and wait for the
    ///    `FDBD joined cluster` log line;
    /// 3. wire the proxy's internal listener to the server's now-known
    ///    address.
    ///
    /// Any failure leaves the composite container unusable; discard it and do
    /// not retry in place.
    pub async fn start(&mut self) -> Result<()> {
        if self.state != ContainerState::NotStarted {
            return Err(Error::AlreadyStarted);
        }
        self.state = ContainerState::Starting;

        self.docker.ping().await?;
        docker::create_network(&self.docker, &self.network_name).await?;
        self.network_created = true;

        // Phase 1: the proxy resolves the one port everyone will use.
        let mut proxy = SocatProxy::new(self.docker.clone());
        let bind_port = proxy.start(&self.network_name, INTERNAL_PORT).await?;
        self.proxy = Some(proxy);
        self.bind_port = Some(bind_port);

        // Phase 2: the server binds that port and joins its cluster.
        self.start_database(bind_port).await?;

        // Phase 3: the proxy forwards its listener to the server address.
        self.proxy
            .as_ref()
            .expect("proxy started in phase 1")
            .forward(INTERNAL_PORT, &self.container_name, bind_port)
            .await?;

        self.state = ContainerState::Started;
        info!(
            "FoundationDB container {} started on port {}",
            self.container_name, bind_port
        );

        self.container_started().await
    }

    async fn start_database(&mut self, bind_port: u16) -> Result<()> {
        let reference = self.config.image.reference();
        docker::ensure_image(&self.docker, &reference).await?;

        let config = Config::<String> {
            image: Some(reference),
            env: Some(vec![
                "FDB_NETWORKING_MODE=host".to_string(),
                format!("FDB_PORT={bind_port}"),
            ]),
            host_config: Some(HostConfig {
                network_mode: Some(self.network_name.clone()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let id = docker::create_and_start(&self.docker, &self.container_name, config).await?;
        self.container_id = Some(id.clone());

        docker::wait_for_log_message(
            &self.docker,
            &id,
            READY_LOG_MESSAGE,
            self.config.startup_timeout,
        )
        .await
    }

    /// Started-transition hook: initialize the database unless an existing one
    /// can be reused.
    async fn container_started(&mut self) -> Result<()> {
        // Probing costs a cli round trip, so it only happens in reuse mode.
        let available = self.config.reuse && self.database_available().await?;

        if should_initialize(self.config.reuse, available) {
            self.configure_new_database().await
        } else {
            debug!("existing database is available, skipping initialization");
            Ok(())
        }
    }

    async fn database_available(&self) -> Result<bool> {
        let output = self.run_fdbcli("status minimal").await?;
        Ok(output.contains(DATABASE_AVAILABLE))
    }

    async fn configure_new_database(&self) -> Result<()> {
        debug!("initializing a single in-memory database");

        let command = "configure new single memory";
        let output = self.run_fdbcli(command).await?;
        if !output.contains(DATABASE_CREATED) {
            return Err(Error::DatabaseInitialization {
                command: command.to_string(),
                output,
            });
        }

        debug!("initialized a single in-memory database");
        Ok(())
    }

    /// Runs an fdbcli command inside the running database container and
    /// returns its stdout.
    ///
    /// A non-zero exit code is always fatal, regardless of the command.
    pub async fn run_fdbcli(&self, command: &str) -> Result<String> {
        let id = self.container_id.as_deref().ok_or(Error::NotStarted)?;

        let output = docker::exec(&self.docker, id, &[FDBCLI, "--exec", command]).await?;
        debug!("fdbcli output: {}", output.stdout.trim());

        if output.exit_code != 0 {
            return Err(Error::DatabaseInitialization {
                command: command.to_string(),
                output: format!("exit code {}: {}", output.exit_code, output.stdout),
            });
        }

        Ok(output.stdout)
    }

    /// The connection string clients use to reach the cluster:
    /// `docker:docker@<host>:<port>` with static placeholder credentials.
    pub fn connection_string(&self) -> Result<String> {
        let port = self.bind_port.ok_or(Error::NotStarted)?;
        Ok(format!("docker:docker@{}:{}", self.host, port))
    }

    /// Path of a temp file containing the connection string, created on first
    /// call and stable afterwards. The file is deleted when the container
    /// stops.
    pub fn cluster_file_path(&mut self) -> Result<PathBuf> {
        if let Some(cluster_file) = &self.cluster_file {
            return Ok(cluster_file.path().to_path_buf());
        }

        let cluster_file = ClusterFile::create(&self.connection_string()?)?;
        let path = cluster_file.path().to_path_buf();
        self.cluster_file = Some(cluster_file);
        Ok(path)
    }

    /// Stops and removes both containers and the private network, deleting the
    /// cluster file first. Safe to call on a never-started wrapper.
    pub async fn stop(&mut self) -> Result<()> {
        if matches!(
            self.state,
            ContainerState::NotStarted | ContainerState::Stopped
        ) {
            return Ok(());
        }
        self.state = ContainerState::Stopping;

        self.container_stopping()?;

        if let Some(id) = self.container_id.take() {
            docker::stop_and_remove(&self.docker, &id).await?;
        }
        if let Some(mut proxy) = self.proxy.take() {
            proxy.stop().await?;
        }
        if self.network_created {
            docker::remove_network(&self.docker, &self.network_name).await?;
            self.network_created = false;
        }

        self.state = ContainerState::Stopped;
        info!("FoundationDB container {} stopped", self.container_name);
        Ok(())
    }

    /// Stopping-transition hook: remove the cluster file if one was created.
    fn container_stopping(&mut self) -> Result<()> {
        if let Some(cluster_file) = self.cluster_file.take() {
            cluster_file.delete()?;
        }
        Ok(())
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ContainerState {
        self.state
    }

    /// The externally bound port, once phase 1 of startup has resolved it.
    pub fn bind_port(&self) -> Option<u16> {
        self.bind_port
    }
}

/// Whether the started transition must configure a new database.
///
/// Reuse mode skips initialization only when the existing database reports
/// available; without reuse mode, initialization always runs.
fn should_initialize(reuse: bool, database_available: bool) -> bool {
    !(reuse && database_available)
}

impl Drop for FoundationDbContainer {
    fn drop(&mut self) {
        // Best-effort cleanup for callers that never reached stop(); the
        // cluster file removes itself when the handle drops.
        if self.container_id.is_none() && self.proxy.is_none() && !self.network_created {
            return;
        }

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!(
                "FoundationDB container {} dropped outside a runtime without stop(), \
                 containers may leak",
                self.container_name
            );
            return;
        };

        let docker = self.docker.clone();
        let container_id = self.container_id.take();
        let proxy_id = self
            .proxy
            .take()
            .and_then(|proxy| proxy.container_id().map(str::to_string));
        let network_name = self.network_created.then(|| self.network_name.clone());

        handle.spawn(async move {
            if let Some(id) = container_id {
                let _ = docker::stop_and_remove(&docker, &id).await;
            }
            if let Some(id) = proxy_id {
                let _ = docker::stop_and_remove(&docker, &id).await;
            }
            if let Some(name) = network_name {
                let _ = docker::remove_network(&docker, &name).await;
            }
        });
    }
}
