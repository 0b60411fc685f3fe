//! Protobuf message schema.
//!
//! Field tags are part of the wire format and must not change.

/// A peer ID and its known network addresses.
#[derive(Clone, PartialEq, prost::Message)]
pub struct PeerInfo {
    /// Base58 peer ID.
    #[prost(string, tag = "1")]
    pub id: String,
    /// Binary multiaddrs.
    #[prost(bytes = "vec", repeated, tag = "2")]
    pub addr: Vec<Vec<u8>>,
}

/// Registration heartbeat sent on the `dir/register` stream.
#[derive(Clone, PartialEq, prost::Message)]
pub struct RegisterPeer {
    #[prost(message, optional, tag = "1")]
    pub info: Option<PeerInfo>,
}

/// Directory lookup request.
#[derive(Clone, PartialEq, prost::Message)]
pub struct LookupPeerRequest {
    /// Base58 peer ID to resolve.
    #[prost(string, tag = "1")]
    pub id: String,
}

/// Directory lookup response. `peer` is absent when the peer is unknown.
#[derive(Clone, PartialEq, prost::Message)]
pub struct LookupPeerResponse {
    #[prost(message, optional, tag = "1")]
    pub peer: Option<PeerInfo>,
}

/// Liveness request.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Ping {}

/// Liveness response.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Pong {}

/// A signed statement about an entity.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Manifest {
    /// Entity the manifest speaks for.
    #[prost(string, tag = "1")]
    pub entity: String,
    /// ID of the key that produced `signature`.
    #[prost(string, tag = "2")]
    pub key_id: String,
    #[prost(message, optional, tag = "3")]
    pub body: Option<ManifestBody>,
    /// Creation time, milliseconds since the Unix epoch.
    #[prost(int64, tag = "4")]
    pub timestamp: i64,
    /// Signature over the encoding of this manifest with an empty signature.
    #[prost(bytes = "vec", tag = "5")]
    pub signature: Vec<u8>,
}

/// Polymorphic manifest body.
#[derive(Clone, PartialEq, prost::Message)]
pub struct ManifestBody {
    #[prost(oneof = "manifest_body::Body", tags = "1")]
    pub body: Option<manifest_body::Body>,
}

/// Body variants for [`ManifestBody`].
pub mod manifest_body {
    /// One case per manifest kind.
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Body {
        /// Binds a node's peer identity to its publisher identity.
        #[prost(message, tag = "1")]
        Node(super::NodeManifest),
    }
}

/// Node manifest body: a peer ID and the publisher ID that vouches for it.
#[derive(Clone, PartialEq, prost::Message)]
pub struct NodeManifest {
    #[prost(string, tag = "1")]
    pub peer: String,
    #[prost(string, tag = "2")]
    pub publisher: String,
}

impl ManifestBody {
    /// Wrap a node manifest.
    pub fn node(node: NodeManifest) -> Self {
        Self {
            body: Some(manifest_body::Body::Node(node)),
        }
    }

    /// The node manifest, if this body holds one.
    pub fn as_node(&self) -> Option<&NodeManifest> {
        match &self.body {
            Some(manifest_body::Body::Node(node)) => Some(node),
            None => None,
        }
    }
}
