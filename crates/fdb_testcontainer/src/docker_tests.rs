use super::*;
use bollard::service::PortBinding;

#[test]
fn test_host_from_docker_host_unset() {
    assert_eq!(host_from_docker_host(None), "localhost");
}

#[test]
fn test_host_from_docker_host_unix_socket() {
    assert_eq!(
        host_from_docker_host(Some("unix:///var/run/docker.sock")),
        "localhost"
    );
}

#[test]
fn test_host_from_docker_host_tcp() {
    assert_eq!(
        host_from_docker_host(Some("tcp://192.168.99.100:2376")),
        "192.168.99.100"
    );
    assert_eq!(
        host_from_docker_host(Some("tcp://docker.example.com:2375")),
        "docker.example.com"
    );
}

#[test]
fn test_host_from_docker_host_http() {
    assert_eq!(
        host_from_docker_host(Some("http://10.0.0.5:2375")),
        "10.0.0.5"
    );
}

fn port_map(container_port: &str, host_port: Option<&str>) -> PortMap {
    let mut ports = PortMap::new();
    ports.insert(
        container_port.to_string(),
        host_port.map(|port| {
            vec![PortBinding {
                host_ip: Some("0.0.0.0".to_string()),
                host_port: Some(port.to_string()),
            }]
        }),
    );
    ports
}

#[test]
fn test_host_port_from_ports_mapped() {
    let ports = port_map("4500/tcp", Some("32768"));

    assert_eq!(host_port_from_ports(&ports, 4500), Some(32768));
}

#[test]
fn test_host_port_from_ports_unmapped() {
    let ports = port_map("4500/tcp", None);

    assert_eq!(host_port_from_ports(&ports, 4500), None);
}

#[test]
fn test_host_port_from_ports_wrong_port() {
    let ports = port_map("4500/tcp", Some("32768"));

    assert_eq!(host_port_from_ports(&ports, 4501), None);
}

#[test]
fn test_host_port_from_ports_unparseable() {
    let ports = port_map("4500/tcp", Some("not-a-port"));

    assert_eq!(host_port_from_ports(&ports, 4500), None);
}

#[test]
fn test_exposed_tcp_port() {
    let exposed = exposed_tcp_port(4500);

    assert_eq!(exposed.len(), 1);
    assert!(exposed.contains_key("4500/tcp"));
}
