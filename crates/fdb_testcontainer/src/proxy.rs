//! Port-binding coordinator: the socat proxy in front of the database.
//!
//! FoundationDB requires that the port its server binds matches the port its
//! clients dial, but the externally reachable port is only known once Docker
//! has created the proxy container. The proxy therefore starts first with an
//! idle placeholder command, the host-assigned port mapped to its internal
//! listen port becomes the single bind port, and only after the database
//! reports started is the real forward wired in with an exec.

use std::time::Duration;

use bollard::container::Config;
use bollard::service::HostConfig;
use bollard::Docker;
use tracing::{debug, info};
use uuid::Uuid;

use crate::docker;
use crate::errors::{Error, Result};

#[cfg(test)]
#[path = "proxy_tests.rs"]
mod tests;

/// Pinned socat image, matching the version testcontainers ships.
pub(crate) const SOCAT_IMAGE: &str = "alpine/socat:1.7.4.3-r0";

/// How long the forward exec is watched for error output. A misconfigured
/// socat fails within milliseconds; a healthy one stays silent.
const STDERR_PROBE_WINDOW: Duration = Duration::from_millis(500);

/// The auxiliary container forwarding one external port to the database.
#[derive(Debug)]
pub(crate) struct SocatProxy {
    docker: Docker,
    container_name: String,
    container_id: Option<String>,
}

impl SocatProxy {
    pub(crate) fn new(docker: Docker) -> Self {
        Self {
            docker,
            container_name: format!("testcontainers-socat-{}", Uuid::new_v4()),
            container_id: None,
        }
    }

    /// Starts the proxy container with no readiness wait and returns the host
    /// port Docker assigned to `internal_port`.
    ///
    /// The container runs an idle forward on an unused port so it stays up
    /// while leaving `internal_port` unbound for [`SocatProxy::forward`].
    pub(crate) async fn start(&mut self, network: &str, internal_port: u16) -> Result<u16> {
        docker::ensure_image(&self.docker, SOCAT_IMAGE).await?;

        let config = Config::<String> {
            image: Some(SOCAT_IMAGE.to_string()),
            entrypoint: Some(vec!["/bin/sh".to_string()]),
            cmd: Some(vec!["-c".to_string(), idle_command(internal_port)]),
            exposed_ports: Some(docker::exposed_tcp_port(internal_port)),
            host_config: Some(HostConfig {
                publish_all_ports: Some(true),
                network_mode: Some(network.to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let id = docker::create_and_start(&self.docker, &self.container_name, config).await?;
        let mapped = docker::mapped_host_port(&self.docker, &id, internal_port).await?;
        self.container_id = Some(id);

        debug!(
            "socat proxy {} maps host port {} to internal port {}",
            self.container_name, mapped, internal_port
        );
        Ok(mapped)
    }

    /// Wires the internal listener to the database's now-known address.
    ///
    /// Any stderr output from the forward command is fatal and surfaces
    /// verbatim as [`Error::ProxyInitialization`].
    pub(crate) async fn forward(
        &self,
        listen_port: u16,
        target_host: &str,
        target_port: u16,
    ) -> Result<()> {
        let id = self.container_id.as_deref().ok_or(Error::NotStarted)?;

        let command = forward_command(listen_port, target_host, target_port);
        let parts: Vec<&str> = command.iter().map(String::as_str).collect();
        let (stdout, stderr) =
            docker::exec_probe_output(&self.docker, id, &parts, STDERR_PROBE_WINDOW).await?;

        if !stdout.is_empty() {
            info!("{}", stdout);
        }
        if !stderr.is_empty() {
            return Err(Error::ProxyInitialization {
                command: command.join(" "),
                output: stderr,
            });
        }

        Ok(())
    }

    /// Stops and removes the proxy container.
    pub(crate) async fn stop(&mut self) -> Result<()> {
        if let Some(id) = self.container_id.take() {
            docker::stop_and_remove(&self.docker, &id).await?;
        }
        Ok(())
    }

    pub(crate) fn container_id(&self) -> Option<&str> {
        self.container_id.as_deref()
    }
}

/// The placeholder command the proxy container runs until the real forward is
/// wired: it binds `internal_port + 1`, keeping `internal_port` free.
fn idle_command(internal_port: u16) -> String {
    let unused = internal_port + 1;
    format!("socat TCP-LISTEN:{unused},fork,reuseaddr TCP:localhost:{unused}")
}

/// The real forward from the proxy's listen port to the database address.
fn forward_command(listen_port: u16, target_host: &str, target_port: u16) -> Vec<String> {
    vec![
        "socat".to_string(),
        format!("TCP-LISTEN:{listen_port},fork,reuseaddr"),
        format!("TCP:{target_host}:{target_port}"),
    ]
}
