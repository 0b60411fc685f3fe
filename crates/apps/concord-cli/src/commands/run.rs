//! Run the node and its control surface.

use concord_net::{HostFactory, Libp2pHostFactory};
use concord_node::Node;
use concord_types::NodeStatus;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::cli::StartState;
use crate::config::CliConfig;
use crate::control::{self, ControlState};
use crate::error::CliResult;
use crate::keys::{load_or_create_keys, NodeKeys};
use crate::signals::shutdown_signal;

/// Execute the run command.
///
/// Blocks until SIGINT or SIGTERM, then takes the node offline.
pub async fn run(
    config: CliConfig,
    config_path: PathBuf,
    control: Option<SocketAddr>,
    start: StartState,
) -> CliResult<String> {
    let keys = load_or_create_keys(&config.identity)?;
    let factory = Arc::new(Libp2pHostFactory::new(config.network_config()));
    let node = Arc::new(build_node(&config, keys, factory)?);

    info!(
        "Node {} (publisher {})",
        node.peer_id(),
        node.publisher().id()
    );

    enter_state(&node, start.into()).await?;

    let bind = match control {
        Some(addr) => addr,
        None => config.control.bind_address()?,
    };
    let state = Arc::new(ControlState::new(Arc::clone(&node), config, Some(config_path)));
    let served = control::serve(state, bind, shutdown_signal()).await;

    if let Err(e) = node.go_offline().await {
        warn!("Shutdown teardown failed: {}", e);
    }
    served?;

    Ok("Node stopped".to_string())
}

/// Create an offline node from the configuration and keys.
pub fn build_node(
    config: &CliConfig,
    keys: NodeKeys,
    host_factory: Arc<dyn HostFactory>,
) -> CliResult<Node> {
    Ok(Node::new(
        keys.node,
        keys.publisher,
        config.node_config()?,
        host_factory,
    ))
}

/// Drive a fresh node into `status`.
pub async fn enter_state(node: &Node, status: NodeStatus) -> CliResult<()> {
    match status {
        NodeStatus::Offline => {}
        NodeStatus::Online => node.go_online().await?,
        NodeStatus::Public => node.go_public().await?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CliError;
    use concord_net::NodeIdentity;
    use concord_node::{NodeError, PublisherIdentity};
    use concord_test_utils::{DirectoryStub, MemoryNetwork};

    fn keys() -> NodeKeys {
        NodeKeys {
            node: NodeIdentity::generate(),
            publisher: PublisherIdentity::generate(),
        }
    }

    fn memory_config(directory: Option<String>) -> CliConfig {
        let mut config = CliConfig::default();
        config.network.listen_address = "/memory/0".to_string();
        config.network.directory = directory;
        config
    }

    #[tokio::test]
    async fn test_start_public_registers() {
        let network = MemoryNetwork::new();
        let directory = DirectoryStub::spawn(&network).unwrap();
        let config = memory_config(Some(directory.handle()));

        let node = build_node(&config, keys(), Arc::new(network.clone())).unwrap();
        enter_state(&node, NodeStatus::Public).await.unwrap();

        assert_eq!(node.status().await, NodeStatus::Public);
        directory.wait_for_registrations(1).await;
        node.go_offline().await.unwrap();
    }

    #[tokio::test]
    async fn test_start_offline_does_nothing() {
        let network = MemoryNetwork::new();
        let node = build_node(&memory_config(None), keys(), Arc::new(network.clone())).unwrap();

        enter_state(&node, NodeStatus::Offline).await.unwrap();
        assert_eq!(node.status().await, NodeStatus::Offline);
        assert_eq!(network.hosts_created(), 0);
    }

    #[tokio::test]
    async fn test_start_public_without_directory() {
        let network = MemoryNetwork::new();
        let node = build_node(&memory_config(None), keys(), Arc::new(network)).unwrap();

        let err = enter_state(&node, NodeStatus::Public).await.unwrap_err();
        assert!(matches!(err, CliError::Node(NodeError::NoDirectory)));
        assert_eq!(node.status().await, NodeStatus::Offline);
    }

    #[test]
    fn test_bad_directory_handle_fails_build() {
        let network = MemoryNetwork::new();
        let config = memory_config(Some("nil".to_string()));
        let err = build_node(&config, keys(), Arc::new(network)).err().unwrap();
        assert!(matches!(err, CliError::Config(_)));
    }
}
