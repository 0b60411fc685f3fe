//! Wire schema and message framing for the Concord node.
//!
//! Every protocol the node speaks exchanges protobuf messages over a
//! bidirectional stream. Each message is one *frame*:
//!
//! ```text
//! [length: unsigned varint]   # payload length, LEB128
//! [payload: bytes]            # protobuf-encoded message
//! ```
//!
//! Payloads are bounded by [`MAX_MESSAGE_SIZE`]; a reader rejects a larger
//! declared length before consuming any payload byte.
//!
//! # Messages
//!
//! | Protocol | Messages |
//! |----------|----------|
//! | Ping | [`Ping`], [`Pong`] |
//! | Directory register | [`RegisterPeer`] |
//! | Directory lookup | [`LookupPeerRequest`], [`LookupPeerResponse`] |
//! | Manifests | [`Manifest`], [`ManifestBody`], [`NodeManifest`] |
//!
//! # Example
//!
//! ```
//! use concord_wire::{read_message, write_message, LookupPeerRequest, MAX_MESSAGE_SIZE};
//! use futures::io::Cursor;
//!
//! # futures::executor::block_on(async {
//! let mut buf = Vec::new();
//! let req = LookupPeerRequest { id: "QmPeer".to_string() };
//! write_message(&mut buf, &req).await.unwrap();
//!
//! let mut cursor = Cursor::new(buf);
//! let back: LookupPeerRequest = read_message(&mut cursor, MAX_MESSAGE_SIZE).await.unwrap();
//! assert_eq!(back, req);
//! # });
//! ```

pub mod error;
pub mod framing;
pub mod message;

pub use concord_types::constants::MAX_MESSAGE_SIZE;
pub use error::{WireError, WireResult};
pub use framing::{read_message, write_message};
pub use message::{
    manifest_body, LookupPeerRequest, LookupPeerResponse, Manifest, ManifestBody, NodeManifest,
    PeerInfo, Ping, Pong, RegisterPeer,
};
