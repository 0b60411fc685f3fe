//! Network lifecycle for the Concord node.
//!
//! This crate owns a node's presence on the network and the three protocols
//! it speaks while present:
//!
//! - **Ping** (`/mediachain/node/ping`): liveness round trips
//! - **Lookup** (`/mediachain/dir/lookup`): resolve a peer through the directory
//! - **Register** (`/mediachain/dir/register`): heartbeat announcing this node
//!
//! # Lifecycle
//!
//! A [`Node`] starts offline. `go_online` brings a host up and starts serving
//! pings; `go_public` additionally registers with the configured directory
//! and keeps re-registering every five minutes; `go_offline` tears all of it
//! down. See [`node`] for the transition rules.
//!
//! # Example
//!
//! ```no_run
//! use concord_net::{Libp2pHostFactory, NetworkConfig, NodeIdentity};
//! use concord_node::{Node, NodeConfig, PublisherIdentity};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), concord_node::NodeError> {
//! let node = Node::new(
//!     NodeIdentity::generate(),
//!     PublisherIdentity::generate(),
//!     NodeConfig::default(),
//!     Arc::new(Libp2pHostFactory::new(NetworkConfig::default())),
//! );
//!
//! node.go_online().await?;
//! # let peer = libp2p::PeerId::random();
//! node.ping(peer, Duration::from_secs(30)).await?;
//! node.go_offline().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
mod directory;
pub mod error;
pub mod nat;
pub mod node;
mod ping;
pub mod publisher;
mod slot;
mod stream;

pub use config::NodeConfig;
pub use error::{NodeError, NodeResult};
pub use nat::{NatConfig, ParseNatError};
pub use node::Node;
pub use publisher::{publisher_id, verify_manifest, PublisherIdentity};

// Re-export the status type the lifecycle reports
pub use concord_types::NodeStatus;
