//! Addresses advertised to the directory under each NAT configuration.

mod common;

use common::node_on;
use concord_node::NatConfig;
use concord_test_utils::{DirectoryStub, MemoryNetwork};
use libp2p::Multiaddr;
use std::time::Duration;
use tokio::time::sleep;

const REGISTER_INTERVAL: Duration = Duration::from_secs(5 * 60);

fn public_addr() -> Multiaddr {
    "/ip4/203.0.113.7/tcp/9001".parse().unwrap()
}

fn advertised(directory: &DirectoryStub, index: usize) -> Vec<Vec<u8>> {
    directory.registrations()[index]
        .1
        .info
        .as_ref()
        .unwrap()
        .addr
        .clone()
}

fn encoded(addrs: &[Multiaddr]) -> Vec<Vec<u8>> {
    addrs.iter().map(|a| a.to_vec()).collect()
}

#[tokio::test(start_paused = true)]
async fn test_manual_nat_advertises_only_that_address() {
    let network = MemoryNetwork::new();
    let directory = DirectoryStub::spawn(&network).unwrap();
    let node = node_on(&network, Some(directory.address_info()));
    node.set_nat(NatConfig::Manual(public_addr()));

    node.go_public().await.unwrap();
    directory.wait_for_registrations(1).await;

    assert_eq!(advertised(&directory, 0), encoded(&[public_addr()]));
    node.go_offline().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_auto_nat_prefers_observed_addresses() {
    let network = MemoryNetwork::new();
    let directory = DirectoryStub::spawn(&network).unwrap();
    let node = node_on(&network, Some(directory.address_info()));
    node.set_nat(NatConfig::Auto);

    node.go_public().await.unwrap();
    directory.wait_for_registrations(1).await;

    // Nothing observed yet: bound addresses
    let bound = node.listen_addresses().await;
    assert_eq!(advertised(&directory, 0), encoded(&bound));

    network.set_observed_addresses(&node.peer_id(), vec![public_addr()]);
    sleep(REGISTER_INTERVAL).await;
    directory.wait_for_registrations(2).await;
    assert_eq!(advertised(&directory, 1), encoded(&[public_addr()]));

    node.go_offline().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_nat_change_applies_to_next_heartbeat() {
    let network = MemoryNetwork::new();
    let directory = DirectoryStub::spawn(&network).unwrap();
    let node = node_on(&network, Some(directory.address_info()));
    assert_eq!(node.nat(), NatConfig::None);

    node.go_public().await.unwrap();
    directory.wait_for_registrations(1).await;
    let bound = node.listen_addresses().await;
    assert_eq!(advertised(&directory, 0), encoded(&bound));

    node.set_nat(NatConfig::Manual(public_addr()));
    assert_eq!(node.nat(), NatConfig::Manual(public_addr()));

    sleep(REGISTER_INTERVAL).await;
    directory.wait_for_registrations(2).await;
    assert_eq!(advertised(&directory, 1), encoded(&[public_addr()]));

    node.go_offline().await.unwrap();
}
