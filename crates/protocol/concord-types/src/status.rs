//! Node network presence.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Network presence of a node.
///
/// Exactly one value holds at any instant. Transitions are owned by the node
/// lifecycle:
///
/// ```text
/// Offline --go_online--> Online --go_public--> Public
/// Offline --go_public--> Online --(auto)--> Public
/// {Online, Public} --go_offline--> Offline
/// ```
///
/// There is no `Public -> Online` demotion; public registration is only
/// dropped by going offline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    /// No transport; network operations fail.
    #[default]
    Offline,
    /// Transport up, not registered with a directory.
    Online,
    /// Transport up and registered with the directory.
    Public,
}

impl NodeStatus {
    /// All states, in transition order.
    pub const ALL: [NodeStatus; 3] = [NodeStatus::Offline, NodeStatus::Online, NodeStatus::Public];

    /// Lowercase name used on the control surface.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeStatus::Offline => "offline",
            NodeStatus::Online => "online",
            NodeStatus::Public => "public",
        }
    }

    /// Returns true if the transport is up.
    pub fn is_networked(&self) -> bool {
        !matches!(self, NodeStatus::Offline)
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown status name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unrecognized state: {0}")]
pub struct ParseStatusError(pub String);

impl FromStr for NodeStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "offline" => Ok(NodeStatus::Offline),
            "online" => Ok(NodeStatus::Online),
            "public" => Ok(NodeStatus::Public),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}
