use super::*;
use crate::image::ImageName;

fn container() -> FoundationDbContainer {
    FoundationDbContainer::new().unwrap()
}

/// Puts a wrapper into the started state without touching Docker, so the
/// connection-artifact accessors can be exercised in isolation.
fn started_container(port: u16) -> FoundationDbContainer {
    let mut container = container();
    container.host = "localhost".to_string();
    container.bind_port = Some(port);
    container.state = ContainerState::Started;
    container
}

#[test]
fn test_new_container_is_not_started() {
    let container = container();

    assert_eq!(container.state(), ContainerState::NotStarted);
    assert_eq!(container.bind_port(), None);
}

#[test]
fn test_connection_string_requires_start() {
    let container = container();

    assert!(matches!(
        container.connection_string(),
        Err(Error::NotStarted)
    ));
}

#[test]
fn test_cluster_file_requires_start() {
    let mut container = container();

    assert!(matches!(
        container.cluster_file_path(),
        Err(Error::NotStarted)
    ));
}

#[test]
fn test_run_fdbcli_requires_start() {
    let container = container();

    let result = tokio::runtime::Runtime::new()
        .unwrap()
        .block_on(container.run_fdbcli("status minimal"));

    assert!(matches!(result, Err(Error::NotStarted)));
}

#[test]
fn test_incompatible_image_rejected_before_any_container_exists() {
    let config = ContainerConfig {
        image: ImageName::new("mysql", "8.0"),
        ..Default::default()
    };

    let result = FoundationDbContainer::with_config(config);

    assert!(matches!(result, Err(Error::IncompatibleImage { .. })));
}

#[test]
fn test_compatible_tag_override_accepted() {
    let config = ContainerConfig::default().with_tag("7.3.27");

    let container = FoundationDbContainer::with_config(config).unwrap();

    assert_eq!(container.config.image.tag(), "7.3.27");
}

#[test]
fn test_connection_string_format() {
    let container = started_container(32768);

    assert_eq!(
        container.connection_string().unwrap(),
        "docker:docker@localhost:32768"
    );
}

#[test]
fn test_cluster_file_contents_equal_connection_string() {
    let mut container = started_container(32768);

    let path = container.cluster_file_path().unwrap();
    let contents = std::fs::read_to_string(&path).unwrap();

    assert_eq!(contents, container.connection_string().unwrap());
}

#[test]
fn test_cluster_file_path_is_idempotent() {
    let mut container = started_container(32768);

    let first = container.cluster_file_path().unwrap();
    let second = container.cluster_file_path().unwrap();

    assert_eq!(first, second);
    assert!(first.exists());
}

#[test]
fn test_stopping_hook_deletes_cluster_file() {
    let mut container = started_container(32768);

    let path = container.cluster_file_path().unwrap();
    assert!(path.exists());

    container.container_stopping().unwrap();

    assert!(!path.exists());
    // A later call creates a fresh file rather than failing
    assert!(container.cluster_file.is_none());
}

#[tokio::test]
async fn test_start_twice_is_rejected() {
    let mut container = started_container(32768);

    let result = container.start().await;

    assert!(matches!(result, Err(Error::AlreadyStarted)));
}

#[tokio::test]
async fn test_stop_before_start_is_a_no_op() {
    let mut container = container();

    container.stop().await.unwrap();

    assert_eq!(container.state(), ContainerState::NotStarted);
}

#[test]
fn test_should_initialize_matrix() {
    // Without reuse, every start configures a new database
    assert!(should_initialize(false, false));
    assert!(should_initialize(false, true));

    // With reuse, only an unavailable database triggers initialization
    assert!(should_initialize(true, false));
    assert!(!should_initialize(true, true));
}

#[test]
fn test_container_names_are_unique_per_instance() {
    let first = container();
    let second = container();

    assert_ne!(first.container_name, second.container_name);
    assert_ne!(first.network_name, second.network_name);
    assert!(first.container_name.starts_with("testcontainers-fdb-"));
}
