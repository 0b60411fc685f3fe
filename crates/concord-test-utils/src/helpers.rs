//! Helper functions for creating test fixtures.

use concord_net::{NodeIdentity, PeerAddressInfo};
use libp2p::{multiaddr::Protocol, Multiaddr};

/// A fresh random node identity.
pub fn test_identity() -> NodeIdentity {
    NodeIdentity::generate()
}

/// An in-memory listen address. Port 0 asks [`MemoryNetwork`](crate::MemoryNetwork)
/// to allocate one.
pub fn memory_addr(port: u64) -> Multiaddr {
    Multiaddr::empty().with(Protocol::Memory(port))
}

/// Address info for a peer that no host on any network answers for.
pub fn unreachable_peer() -> PeerAddressInfo {
    PeerAddressInfo::new(test_identity().peer_id(), vec![memory_addr(u64::MAX)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_addr_format() {
        assert_eq!(memory_addr(7).to_string(), "/memory/7");
    }

    #[test]
    fn test_unreachable_peer_handle_parses() {
        let peer = unreachable_peer();
        let parsed = PeerAddressInfo::parse_handle(&peer.format_handle()).unwrap();
        assert_eq!(parsed, peer);
    }
}
