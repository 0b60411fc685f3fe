//! Loopback tests for the libp2p host.

use concord_net::{
    stream_handler, Host, HostFactory, Libp2pHostFactory, NetworkConfig, NetworkError,
    NodeIdentity, PeerAddressInfo, PeerStream, StreamProtocol,
};
use concord_wire::{Ping, Pong};
use std::sync::Arc;
use std::time::Duration;

const ECHO: StreamProtocol = StreamProtocol::new("/concord/test/echo");

async fn start_host() -> Arc<dyn Host> {
    let factory = Libp2pHostFactory::new(NetworkConfig::default());
    factory
        .create(
            &NodeIdentity::generate(),
            &"/ip4/127.0.0.1/tcp/0".parse().unwrap(),
        )
        .await
        .expect("host should start")
}

async fn address_of(host: &Arc<dyn Host>) -> PeerAddressInfo {
    for _ in 0..100 {
        let addrs = host.listen_addresses();
        if !addrs.is_empty() {
            return PeerAddressInfo::new(host.local_peer_id(), addrs);
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("host never reported a listen address");
}

#[tokio::test]
async fn test_connect_and_exchange_messages() {
    let server = start_host().await;
    let client = start_host().await;

    server
        .set_stream_handler(
            ECHO,
            stream_handler(|mut stream: PeerStream| async move {
                while stream.read_message::<Ping>().await.is_ok() {
                    if stream.write_message(&Pong {}).await.is_err() {
                        break;
                    }
                }
            }),
        )
        .unwrap();

    let server_info = address_of(&server).await;
    client.connect(&server_info).await.unwrap();
    // Connecting again is a no-op
    client.connect(&server_info).await.unwrap();

    let mut stream = client
        .open_stream(server.local_peer_id(), ECHO)
        .await
        .unwrap();
    assert_eq!(stream.peer(), server.local_peer_id());

    for _ in 0..3 {
        stream.write_message(&Ping {}).await.unwrap();
        let _: Pong = stream.read_message().await.unwrap();
    }
    stream.close().await.unwrap();

    client.close().await.unwrap();
    server.close().await.unwrap();
}

#[tokio::test]
async fn test_duplicate_handler_rejected() {
    let host = start_host().await;
    let noop = stream_handler(|_stream: PeerStream| async {});

    host.set_stream_handler(ECHO, noop.clone()).unwrap();
    let err = host.set_stream_handler(ECHO, noop).unwrap_err();
    assert!(matches!(err, NetworkError::HandlerAlreadyRegistered(_)));

    host.close().await.unwrap();
}

#[tokio::test]
async fn test_connect_to_unreachable_peer_fails() {
    let host = start_host().await;
    // Nothing listens on the discard port
    let ghost = PeerAddressInfo::new(
        NodeIdentity::generate().peer_id(),
        vec!["/ip4/127.0.0.1/tcp/9".parse().unwrap()],
    );

    let err = host.connect(&ghost).await.unwrap_err();
    assert!(err.is_transient() || matches!(err, NetworkError::DialError(_)));

    host.close().await.unwrap();
}

#[tokio::test]
async fn test_closed_host_rejects_operations() {
    let host = start_host().await;
    host.close().await.unwrap();
    // Idempotent
    host.close().await.unwrap();

    let err = host
        .open_stream(NodeIdentity::generate().peer_id(), ECHO)
        .await
        .unwrap_err();
    assert!(matches!(err, NetworkError::HostClosed));
}
