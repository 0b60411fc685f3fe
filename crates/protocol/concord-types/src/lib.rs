//! Shared data structures for the Concord node.
//!
//! This crate holds the pieces every other Concord crate agrees on:
//!
//! - **Constants**: message size bound, protocol endpoint IDs, timer intervals
//! - **Node status**: the `Offline` / `Online` / `Public` presence states
//! - **Error codes**: a flat taxonomy every crate-level error maps onto
//!
//! # Example
//!
//! ```
//! use concord_types::NodeStatus;
//!
//! let status: NodeStatus = "public".parse().unwrap();
//! assert_eq!(status, NodeStatus::Public);
//! assert_eq!(status.to_string(), "public");
//! ```

pub mod constants;
pub mod error;
pub mod status;

pub use error::ErrorCode;
pub use status::{NodeStatus, ParseStatusError};
