//! Thin bollard plumbing shared by the proxy and database units.
//!
//! This module wraps the handful of Docker daemon operations the container
//! wrapper needs: image pulls, container create/start/stop/remove, a bounded
//! wait for a readiness log line, host-port lookup, and command execution
//! inside a running container with captured output.

use std::collections::HashMap;
use std::time::Duration;

use bollard::container::{
    Config, CreateContainerOptions, LogOutput, LogsOptions, RemoveContainerOptions,
    StartContainerOptions, StopContainerOptions,
};
use bollard::exec::{CreateExecOptions, StartExecResults};
use bollard::image::CreateImageOptions;
use bollard::network::CreateNetworkOptions;
use bollard::service::PortMap;
use bollard::Docker;
use futures_util::StreamExt;
use tracing::debug;

use crate::errors::{Error, Result};

#[cfg(test)]
#[path = "docker_tests.rs"]
mod tests;

/// Output captured from a command executed inside a running container.
#[derive(Debug, Clone)]
pub(crate) struct ExecOutput {
    pub exit_code: i64,
    pub stdout: String,
    pub stderr: String,
}

/// Connects to the local Docker daemon.
pub(crate) fn connect() -> Result<Docker> {
    Ok(Docker::connect_with_local_defaults()?)
}

/// The hostname external clients use to reach mapped container ports.
///
/// Derived from `DOCKER_HOST` when it points at a remote daemon, otherwise
/// `localhost`.
pub(crate) fn docker_host() -> String {
    host_from_docker_host(std::env::var("DOCKER_HOST").ok().as_deref())
}

fn host_from_docker_host(value: Option<&str>) -> String {
    let Some(value) = value.map(str::trim) else {
        return "localhost".to_string();
    };

    for scheme in ["tcp://", "http://", "https://"] {
        if let Some(rest) = value.strip_prefix(scheme) {
            let authority = rest.split('/').next().unwrap_or(rest);
            let host = authority
                .rsplit_once(':')
                .map(|(host, _port)| host)
                .unwrap_or(authority);
            if !host.is_empty() {
                return host.to_string();
            }
        }
    }

    // Unix socket or unrecognized scheme: the daemon is local.
    "localhost".to_string()
}

/// Makes sure `reference` is present locally, pulling it when missing.
pub(crate) async fn ensure_image(docker: &Docker, reference: &str) -> Result<()> {
    match docker.inspect_image(reference).await {
        Ok(_) => return Ok(()),
        Err(bollard::errors::Error::DockerResponseServerError {
            status_code: 404, ..
        }) => {}
        Err(e) => return Err(e.into()),
    }

    debug!("pulling image {}", reference);
    let options = CreateImageOptions::<String> {
        from_image: reference.to_string(),
        ..Default::default()
    };

    let mut stream = docker.create_image(Some(options), None, None);
    while let Some(progress) = stream.next().await {
        let info = progress?;
        if let Some(message) = info.error {
            return Err(Error::ImagePull {
                image: reference.to_string(),
                message,
            });
        }
    }

    Ok(())
}

/// Creates a private bridge network for the two composed containers.
pub(crate) async fn create_network(docker: &Docker, name: &str) -> Result<()> {
    docker
        .create_network(CreateNetworkOptions::<String> {
            name: name.to_string(),
            check_duplicate: true,
            ..Default::default()
        })
        .await?;
    Ok(())
}

/// Removes a network created by [`create_network`].
pub(crate) async fn remove_network(docker: &Docker, name: &str) -> Result<()> {
    docker.remove_network(name).await?;
    Ok(())
}

/// Creates and starts a container, returning its id.
pub(crate) async fn create_and_start(
    docker: &Docker,
    name: &str,
    config: Config<String>,
) -> Result<String> {
    let container = docker
        .create_container(
            Some(CreateContainerOptions {
                name,
                ..Default::default()
            }),
            config,
        )
        .await?;

    docker
        .start_container(&container.id, None::<StartContainerOptions<String>>)
        .await?;

    Ok(container.id)
}

/// Follows the container log and waits for a line containing `needle`.
///
/// The wait is bounded by `timeout`; both an elapsed timeout and a log stream
/// that ends early (container exited) surface as [`Error::StartupTimeout`].
pub(crate) async fn wait_for_log_message(
    docker: &Docker,
    container_id: &str,
    needle: &str,
    timeout: Duration,
) -> Result<()> {
    let options = LogsOptions::<String> {
        follow: true,
        stdout: true,
        stderr: true,
        ..Default::default()
    };
    let mut logs = docker.logs(container_id, Some(options));

    let matched = tokio::time::timeout(timeout, async {
        while let Some(frame) = logs.next().await {
            let frame = frame?;
            if frame.to_string().contains(needle) {
                return Ok(true);
            }
        }
        Ok::<bool, Error>(false)
    })
    .await;

    match matched {
        Ok(Ok(true)) => Ok(()),
        Ok(Err(e)) => Err(e),
        _ => Err(Error::StartupTimeout {
            pattern: needle.to_string(),
            timeout,
        }),
    }
}

/// Reads the host port Docker assigned to `container_port`.
pub(crate) async fn mapped_host_port(
    docker: &Docker,
    container_id: &str,
    container_port: u16,
) -> Result<u16> {
    let inspect = docker.inspect_container(container_id, None).await?;
    let ports = inspect
        .network_settings
        .and_then(|settings| settings.ports)
        .unwrap_or_default();

    host_port_from_ports(&ports, container_port).ok_or(Error::PortMapping {
        port: container_port,
    })
}

fn host_port_from_ports(ports: &PortMap, container_port: u16) -> Option<u16> {
    ports
        .get(&format!("{container_port}/tcp"))
        .and_then(|bindings| bindings.as_ref())
        .and_then(|bindings| bindings.first())
        .and_then(|binding| binding.host_port.as_deref())
        .and_then(|port| port.parse().ok())
}

/// Runs a command inside a running container and waits for it to finish.
pub(crate) async fn exec(docker: &Docker, container_id: &str, cmd: &[&str]) -> Result<ExecOutput> {
    let created = docker
        .create_exec(
            container_id,
            CreateExecOptions::<String> {
                cmd: Some(cmd.iter().map(|part| part.to_string()).collect()),
                attach_stdout: Some(true),
                attach_stderr: Some(true),
                ..Default::default()
            },
        )
        .await?;

    let mut stdout = String::new();
    let mut stderr = String::new();

    if let StartExecResults::Attached { mut output, .. } =
        docker.start_exec(&created.id, None).await?
    {
        while let Some(frame) = output.next().await {
            match frame? {
                LogOutput::StdOut { message } => {
                    stdout.push_str(&String::from_utf8_lossy(&message));
                }
                LogOutput::StdErr { message } => {
                    stderr.push_str(&String::from_utf8_lossy(&message));
                }
                _ => {}
            }
        }
    }

    let inspect = docker.inspect_exec(&created.id).await?;

    Ok(ExecOutput {
        exit_code: inspect.exit_code.unwrap_or(-1),
        stdout,
        stderr,
    })
}

/// Starts a long-running command inside a container and captures any output it
/// produces within `probe_window`.
///
/// Used for the socat forward, which is expected to keep running: a healthy
/// forward stays silent, while a misconfigured one writes to stderr and exits
/// almost immediately. The exec keeps running server-side after the probe
/// window closes.
pub(crate) async fn exec_probe_output(
    docker: &Docker,
    container_id: &str,
    cmd: &[&str],
    probe_window: Duration,
) -> Result<(String, String)> {
    let created = docker
        .create_exec(
            container_id,
            CreateExecOptions::<String> {
                cmd: Some(cmd.iter().map(|part| part.to_string()).collect()),
                attach_stdout: Some(true),
                attach_stderr: Some(true),
                ..Default::default()
            },
        )
        .await?;

    let mut stdout = String::new();
    let mut stderr = String::new();

    if let StartExecResults::Attached { mut output, .. } =
        docker.start_exec(&created.id, None).await?
    {
        let deadline = tokio::time::sleep(probe_window);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                _ = &mut deadline => break,
                frame = output.next() => match frame {
                    Some(Ok(LogOutput::StdOut { message })) => {
                        stdout.push_str(&String::from_utf8_lossy(&message));
                    }
                    Some(Ok(LogOutput::StdErr { message })) => {
                        stderr.push_str(&String::from_utf8_lossy(&message));
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e.into()),
                    None => break,
                },
            }
        }
    }

    Ok((stdout, stderr))
}

/// Stops and force-removes a container.
pub(crate) async fn stop_and_remove(docker: &Docker, container_id: &str) -> Result<()> {
    docker
        .stop_container(container_id, Some(StopContainerOptions { t: 5 }))
        .await?;

    docker
        .remove_container(
            container_id,
            Some(RemoveContainerOptions {
                force: true,
                ..Default::default()
            }),
        )
        .await?;

    Ok(())
}

/// Builds the `exposed_ports` map for a container config.
pub(crate) fn exposed_tcp_port(port: u16) -> HashMap<String, HashMap<(), ()>> {
    let mut exposed = HashMap::new();
    exposed.insert(format!("{port}/tcp"), HashMap::new());
    exposed
}
