//! Node identity.
//!
//! The node identity is a libp2p Ed25519 keypair. Its peer ID is what other
//! nodes dial and what the directory indexes.

use crate::error::{NetworkError, NetworkResult};
use libp2p::{identity::Keypair, PeerId};
use std::fmt;

/// A node's network keypair and the peer ID derived from it.
#[derive(Clone)]
pub struct NodeIdentity {
    keypair: Keypair,
    peer_id: PeerId,
}

impl NodeIdentity {
    /// Generate a fresh Ed25519 identity.
    pub fn generate() -> Self {
        Self::from_keypair(Keypair::generate_ed25519())
    }

    /// Wrap an existing keypair.
    pub fn from_keypair(keypair: Keypair) -> Self {
        let peer_id = keypair.public().to_peer_id();
        Self { keypair, peer_id }
    }

    /// Decode a keypair from libp2p's protobuf key encoding.
    pub fn from_protobuf_encoding(bytes: &[u8]) -> NetworkResult<Self> {
        let keypair = Keypair::from_protobuf_encoding(bytes)
            .map_err(|e| NetworkError::Identity(e.to_string()))?;
        Ok(Self::from_keypair(keypair))
    }

    /// Encode the keypair with libp2p's protobuf key encoding.
    pub fn to_protobuf_encoding(&self) -> NetworkResult<Vec<u8>> {
        self.keypair
            .to_protobuf_encoding()
            .map_err(|e| NetworkError::Identity(e.to_string()))
    }

    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }

    pub fn peer_id(&self) -> PeerId {
        self.peer_id
    }
}

impl fmt::Debug for NodeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeIdentity")
            .field("peer_id", &self.peer_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_preserves_peer_id() {
        let identity = NodeIdentity::generate();
        let bytes = identity.to_protobuf_encoding().unwrap();
        let restored = NodeIdentity::from_protobuf_encoding(&bytes).unwrap();
        assert_eq!(identity.peer_id(), restored.peer_id());
    }

    #[test]
    fn test_distinct_identities() {
        assert_ne!(
            NodeIdentity::generate().peer_id(),
            NodeIdentity::generate().peer_id()
        );
    }

    #[test]
    fn test_rejects_garbage() {
        let result = NodeIdentity::from_protobuf_encoding(b"not a key");
        assert!(matches!(result, Err(NetworkError::Identity(_))));
    }

    #[test]
    fn test_debug_hides_key_material() {
        let identity = NodeIdentity::generate();
        let debug = format!("{:?}", identity);
        assert!(debug.contains(&identity.peer_id().to_string()));
        assert!(!debug.contains("keypair"));
    }
}
