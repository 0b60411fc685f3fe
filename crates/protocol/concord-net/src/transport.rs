//! Transport layer for the Concord node.
//!
//! This module builds the libp2p transport stack using:
//! - DNS for hostname resolution
//! - TCP for connectivity
//! - Noise (XX handshake) for encryption
//! - Yamux for multiplexing

use crate::error::{NetworkError, NetworkResult};
use libp2p::{
    core::{muxing::StreamMuxerBox, transport::Boxed, upgrade},
    dns,
    identity::Keypair,
    noise, tcp, yamux, PeerId, Transport,
};
use std::time::Duration;

/// The boxed transport type handed to the swarm.
pub type BoxedTransport = Boxed<(PeerId, StreamMuxerBox)>;

/// Build the libp2p transport stack.
///
/// The transport stack consists of:
/// 1. DNS for resolving hostnames (dns4/dns6)
/// 2. TCP for base connectivity
/// 3. Noise protocol (XX handshake) for encryption
/// 4. Yamux for stream multiplexing
pub fn build_transport(keypair: &Keypair, timeout: Duration) -> NetworkResult<BoxedTransport> {
    // Create TCP transport with nodelay for low latency
    let tcp_config = tcp::Config::default().nodelay(true);
    let tcp = tcp::tokio::Transport::new(tcp_config);

    // Wrap TCP with DNS resolution support
    let dns_tcp = dns::tokio::Transport::system(tcp)
        .map_err(|e| NetworkError::Transport(format!("DNS resolver: {}", e)))?;

    let noise_config = noise::Config::new(keypair)
        .map_err(|e| NetworkError::Transport(format!("noise config: {}", e)))?;

    Ok(dns_tcp
        .upgrade(upgrade::Version::V1)
        .authenticate(noise_config)
        .multiplex(yamux::Config::default())
        .timeout(timeout)
        .boxed())
}
