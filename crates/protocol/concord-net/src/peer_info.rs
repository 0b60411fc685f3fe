//! Peer addressing.
//!
//! A [`PeerAddressInfo`] is a peer ID plus the addresses it can be reached at.
//! Operators refer to a peer with a single-string *handle*,
//! `<multiaddr>/p2p/<peer-id>`, e.g. the directory in the node config.

use crate::error::{NetworkError, NetworkResult};
use concord_wire::PeerInfo;
use libp2p::{multiaddr::Protocol, Multiaddr, PeerId};
use std::fmt;
use std::str::FromStr;

/// A peer ID and its known addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerAddressInfo {
    pub id: PeerId,
    pub addrs: Vec<Multiaddr>,
}

impl PeerAddressInfo {
    pub fn new(id: PeerId, addrs: Vec<Multiaddr>) -> Self {
        Self { id, addrs }
    }

    /// Convert to the wire representation (base58 ID, binary multiaddrs).
    pub fn to_wire(&self) -> PeerInfo {
        PeerInfo {
            id: self.id.to_base58(),
            addr: self.addrs.iter().map(|a| a.to_vec()).collect(),
        }
    }

    /// Convert from the wire representation.
    ///
    /// Fails if the ID is not a valid peer ID or any address is not a valid
    /// binary multiaddr.
    pub fn from_wire(info: &PeerInfo) -> NetworkResult<Self> {
        let id = PeerId::from_str(&info.id)
            .map_err(|e| NetworkError::InvalidPeerInfo(format!("peer id {:?}: {}", info.id, e)))?;

        let addrs = info
            .addr
            .iter()
            .map(|bytes| {
                Multiaddr::try_from(bytes.clone())
                    .map_err(|e| NetworkError::InvalidPeerInfo(format!("address: {}", e)))
            })
            .collect::<NetworkResult<Vec<_>>>()?;

        Ok(Self { id, addrs })
    }

    /// Parse a peer handle.
    ///
    /// Accepts `<multiaddr>/p2p/<peer-id>` and the legacy `<multiaddr>/<peer-id>`.
    pub fn parse_handle(handle: &str) -> NetworkResult<Self> {
        let handle = handle.trim();

        if let Ok(mut addr) = handle.parse::<Multiaddr>() {
            if let Some(Protocol::P2p(id)) = addr.pop() {
                let addrs = if addr.is_empty() { vec![] } else { vec![addr] };
                return Ok(Self { id, addrs });
            }
        }

        // Legacy form: the last path segment is a bare peer ID
        let (addr, id) = handle
            .rsplit_once('/')
            .ok_or_else(|| NetworkError::InvalidHandle(handle.to_string()))?;
        let id = PeerId::from_str(id)
            .map_err(|e| NetworkError::InvalidHandle(format!("{}: {}", handle, e)))?;
        let addr = Multiaddr::from_str(addr)
            .map_err(|e| NetworkError::InvalidHandle(format!("{}: {}", handle, e)))?;

        if addr.is_empty() {
            return Err(NetworkError::InvalidHandle(handle.to_string()));
        }

        Ok(Self {
            id,
            addrs: vec![addr],
        })
    }

    /// Format as a peer handle using the first address.
    pub fn format_handle(&self) -> String {
        let base = self.addrs.first().cloned().unwrap_or_else(Multiaddr::empty);
        base.with(Protocol::P2p(self.id)).to_string()
    }
}

impl FromStr for PeerAddressInfo {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_handle(s)
    }
}

impl fmt::Display for PeerAddressInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_handle())
    }
}
