//! Publisher identity and signed manifests.
//!
//! A node has two identities: the network identity its peers dial, and a
//! publisher identity that signs the statements it publishes. The node
//! manifest binds the two together:
//!
//! ```text
//! Manifest {
//!     entity:    <publisher id>
//!     keyId:     <publisher id>
//!     body:      Node { peer: <peer id>, publisher: <publisher id> }
//!     timestamp: <ms since epoch>
//!     signature: Ed25519(encode(manifest with empty signature))
//! }
//! ```
//!
//! The publisher ID is `base58(sha256(public_key))`.

use crate::error::{NodeError, NodeResult};
use concord_wire::{Manifest, ManifestBody, NodeManifest};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use libp2p::PeerId;
use prost::Message;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Ed25519 key that signs this node's manifests.
#[derive(Clone)]
pub struct PublisherIdentity {
    signing_key: SigningKey,
    id: String,
}

impl PublisherIdentity {
    /// Generate a new publisher key using the OS RNG.
    pub fn generate() -> Self {
        Self::from_signing_key(SigningKey::generate(&mut OsRng))
    }

    pub fn from_signing_key(signing_key: SigningKey) -> Self {
        let id = publisher_id(&signing_key.verifying_key());
        Self { signing_key, id }
    }

    /// Load from a raw 32-byte Ed25519 secret.
    pub fn from_secret_bytes(bytes: &[u8]) -> NodeResult<Self> {
        let secret: [u8; 32] = bytes.try_into().map_err(|_| {
            NodeError::InvalidKey(format!("expected 32 bytes, got {}", bytes.len()))
        })?;
        Ok(Self::from_signing_key(SigningKey::from_bytes(&secret)))
    }

    /// The raw 32-byte secret, for persisting.
    pub fn secret_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Sign `body` as a manifest for this publisher.
    pub fn sign_manifest(&self, body: ManifestBody, timestamp: i64) -> Manifest {
        let mut manifest = Manifest {
            entity: self.id.clone(),
            key_id: self.id.clone(),
            body: Some(body),
            timestamp,
            signature: Vec::new(),
        };
        let signature = self.signing_key.sign(&manifest.encode_to_vec());
        manifest.signature = signature.to_bytes().to_vec();
        manifest
    }

    /// Sign a manifest binding `peer` to this publisher, stamped now.
    pub fn node_manifest(&self, peer: &PeerId) -> NodeResult<Manifest> {
        let body = ManifestBody::node(NodeManifest {
            peer: peer.to_base58(),
            publisher: self.id.clone(),
        });
        Ok(self.sign_manifest(body, now_millis()?))
    }
}

impl fmt::Debug for PublisherIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublisherIdentity")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// Derive a publisher ID from its public key.
pub fn publisher_id(key: &VerifyingKey) -> String {
    let hash = Sha256::digest(key.as_bytes());
    bs58::encode(hash).into_string()
}

/// Check that `manifest` was signed by `key` and names it as the signer.
pub fn verify_manifest(manifest: &Manifest, key: &VerifyingKey) -> NodeResult<()> {
    if manifest.key_id != publisher_id(key) {
        return Err(NodeError::InvalidSignature(format!(
            "manifest key {} does not match verifying key",
            manifest.key_id
        )));
    }

    let signature = Signature::from_slice(&manifest.signature)
        .map_err(|e| NodeError::InvalidSignature(e.to_string()))?;

    let mut unsigned = manifest.clone();
    unsigned.signature.clear();

    key.verify(&unsigned.encode_to_vec(), &signature)
        .map_err(|e| NodeError::InvalidSignature(e.to_string()))
}

fn now_millis() -> NodeResult<i64> {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| NodeError::Internal(format!("system clock before epoch: {}", e)))?;
    i64::try_from(elapsed.as_millis())
        .map_err(|_| NodeError::Internal("timestamp overflow".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publisher_id_is_stable() {
        let publisher = PublisherIdentity::generate();
        let restored = PublisherIdentity::from_secret_bytes(&publisher.secret_bytes()).unwrap();
        assert_eq!(publisher.id(), restored.id());
        assert_eq!(publisher.id(), publisher_id(&publisher.verifying_key()));
    }

    #[test]
    fn test_publisher_id_format() {
        let publisher = PublisherIdentity::generate();
        let decoded = bs58::decode(publisher.id()).into_vec().unwrap();
        assert_eq!(decoded.len(), 32);
    }

    #[test]
    fn test_rejects_short_secret() {
        let err = PublisherIdentity::from_secret_bytes(&[0u8; 31]).unwrap_err();
        assert!(matches!(err, NodeError::InvalidKey(_)));
    }

    #[test]
    fn test_node_manifest_verifies() {
        let publisher = PublisherIdentity::generate();
        let peer = PeerId::random();
        let manifest = publisher.node_manifest(&peer).unwrap();

        assert_eq!(manifest.entity, publisher.id());
        assert_eq!(manifest.key_id, publisher.id());
        assert!(manifest.timestamp > 0);

        let node = manifest.body.as_ref().and_then(|b| b.as_node()).unwrap();
        assert_eq!(node.peer, peer.to_base58());
        assert_eq!(node.publisher, publisher.id());

        verify_manifest(&manifest, &publisher.verifying_key()).unwrap();
    }

    #[test]
    fn test_tampered_manifest_fails() {
        let publisher = PublisherIdentity::generate();
        let mut manifest = publisher.node_manifest(&PeerId::random()).unwrap();
        manifest.timestamp += 1;

        let err = verify_manifest(&manifest, &publisher.verifying_key()).unwrap_err();
        assert!(matches!(err, NodeError::InvalidSignature(_)));
    }

    #[test]
    fn test_wrong_key_fails() {
        let publisher = PublisherIdentity::generate();
        let other = PublisherIdentity::generate();
        let manifest = publisher.node_manifest(&PeerId::random()).unwrap();

        assert!(verify_manifest(&manifest, &other.verifying_key()).is_err());
    }

    #[test]
    fn test_debug_hides_secret() {
        let publisher = PublisherIdentity::generate();
        let debug = format!("{:?}", publisher);
        assert!(debug.contains(publisher.id()));
        assert!(!debug.contains("signing_key"));
    }
}
