//! Network behaviour for the Concord node.
//!
//! Two protocols are composed with libp2p's derive macro:
//! - Stream: raw protocol streams for ping and the directory protocols
//! - Identify: peer identification and address exchange

use crate::config::NetworkConfig;
use libp2p::{identify, identity::Keypair, swarm::NetworkBehaviour};

/// Combined network behaviour for a Concord host.
#[derive(NetworkBehaviour)]
pub struct NodeBehaviour {
    /// Raw per-protocol streams.
    pub stream: libp2p_stream::Behaviour,

    /// Identify for peer discovery and capability exchange.
    pub identify: identify::Behaviour,
}

impl NodeBehaviour {
    /// Create the behaviour for the given host keypair.
    pub fn new(keypair: &Keypair, config: &NetworkConfig) -> Self {
        let identify = identify::Behaviour::new(identify::Config::new(
            config.identify_protocol_version.clone(),
            keypair.public(),
        ));

        Self {
            stream: libp2p_stream::Behaviour::new(),
            identify,
        }
    }
}
