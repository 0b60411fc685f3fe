//! Shared test utilities for the Concord node.
//!
//! - [`MemoryNetwork`]: an in-process [`HostFactory`](concord_net::HostFactory)
//!   whose hosts exchange streams over in-memory pipes
//! - [`DirectoryStub`]: a directory server that records registrations and
//!   answers lookups
//! - [`SilentPeer`]: a peer that accepts pings and never answers

pub mod directory_stub;
pub mod helpers;
pub mod memory_network;
pub mod silent_peer;

pub use directory_stub::DirectoryStub;
pub use helpers::*;
pub use memory_network::{MemoryHost, MemoryNetwork};
pub use silent_peer::SilentPeer;
