//! Transport seam for the Concord node.
//!
//! The node's protocols only need a small slice of a networking stack:
//! connect to a peer at known addresses, open a raw stream for a protocol,
//! accept inbound streams for a protocol, and shut everything down. This
//! crate defines that slice as the [`Host`] trait and provides a libp2p
//! implementation of it.
//!
//! # Overview
//!
//! - **Transport**: TCP + DNS + Noise (encryption) + Yamux (multiplexing)
//! - **Streams**: `libp2p-stream` raw protocol streams, framed by `concord-wire`
//! - **Identify**: address exchange with connected peers
//!
//! # Example
//!
//! ```no_run
//! use concord_net::{Host, HostFactory, Libp2pHostFactory, NetworkConfig, NodeIdentity};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let identity = NodeIdentity::generate();
//! let factory = Libp2pHostFactory::new(NetworkConfig::default());
//! let host = factory
//!     .create(&identity, &"/ip4/0.0.0.0/tcp/9001".parse()?)
//!     .await?;
//!
//! println!("listening as {}", host.local_peer_id());
//! host.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod behaviour;
pub mod config;
pub mod error;
pub mod host;
pub mod identity;
pub mod peer_info;
pub mod swarm;
pub mod transport;

// Configuration
pub use config::NetworkConfig;

// Error types
pub use error::{NetworkError, NetworkResult};

// The transport seam
pub use host::{stream_handler, Host, HostFactory, PeerStream, StreamHandler, StreamIo};

// Identity and addressing
pub use identity::NodeIdentity;
pub use peer_info::PeerAddressInfo;

// libp2p implementation
pub use swarm::{Libp2pHost, Libp2pHostFactory};

// Re-export libp2p types commonly needed
pub use libp2p::{multiaddr, Multiaddr, PeerId, StreamProtocol};
