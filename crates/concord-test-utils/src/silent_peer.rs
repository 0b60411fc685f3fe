//! A peer that accepts ping streams and never replies.

use concord_net::{stream_handler, Host, NetworkResult, NodeIdentity, PeerAddressInfo, StreamProtocol};
use concord_types::constants::PING_PROTOCOL;
use concord_wire::Ping;
use libp2p::PeerId;

use crate::helpers::memory_addr;
use crate::memory_network::{MemoryHost, MemoryNetwork};

/// Reads pings and holds the stream open without answering.
pub struct SilentPeer {
    host: MemoryHost,
}

impl SilentPeer {
    pub fn spawn(network: &MemoryNetwork) -> NetworkResult<Self> {
        let host = network.spawn_host(&NodeIdentity::generate(), &memory_addr(0))?;
        host.set_stream_handler(
            StreamProtocol::new(PING_PROTOCOL),
            stream_handler(|mut stream| async move {
                while stream.read_message::<Ping>().await.is_ok() {}
            }),
        )?;
        Ok(Self { host })
    }

    pub fn peer_id(&self) -> PeerId {
        self.host.local_peer_id()
    }

    pub fn address_info(&self) -> PeerAddressInfo {
        self.host.address_info()
    }
}
