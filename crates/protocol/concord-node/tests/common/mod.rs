use concord_net::PeerAddressInfo;
use concord_node::{Node, NodeConfig, PublisherIdentity};
use concord_test_utils::{memory_addr, test_identity, MemoryNetwork};
use std::sync::Arc;

pub fn node_on(network: &MemoryNetwork, directory: Option<PeerAddressInfo>) -> Node {
    let mut config = NodeConfig::new().with_listen_address(memory_addr(0));
    if let Some(directory) = directory {
        config = config.with_directory(directory);
    }
    Node::new(
        test_identity(),
        PublisherIdentity::generate(),
        config,
        Arc::new(network.clone()),
    )
}
