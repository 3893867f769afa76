//! End-to-end test utilities for the FoundationDB test container.
//!
//! The tests under `tests/` drive real containers and therefore need a
//! reachable Docker daemon; they skip themselves when none is available so
//! the suite stays green on machines without Docker.

use bollard::Docker;

/// Initializes tracing for a test binary. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Whether a Docker daemon is reachable.
pub async fn docker_available() -> bool {
    match Docker::connect_with_local_defaults() {
        Ok(docker) => docker.ping().await.is_ok(),
        Err(_) => false,
    }
}
