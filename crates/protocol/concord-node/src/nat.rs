//! NAT configuration.
//!
//! Decides which addresses a public node advertises to the directory:
//!
//! - `none`: the addresses the host is bound to
//! - `*`: addresses peers have observed this host at, falling back to the
//!   bound addresses until one is known
//! - any multiaddr: exactly that address, for a manually forwarded port

use crate::slot::Slot;
use libp2p::Multiaddr;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// How the node is reachable from outside its network.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NatConfig {
    #[default]
    None,
    Auto,
    Manual(Multiaddr),
}

/// The NAT configuration, shared with the registration task.
pub(crate) type NatSlot = Slot<NatConfig>;

/// Unparseable NAT configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid NAT configuration {0:?}: expected none, * or a multiaddr")]
pub struct ParseNatError(pub String);

impl fmt::Display for NatConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NatConfig::None => f.write_str("none"),
            NatConfig::Auto => f.write_str("*"),
            NatConfig::Manual(addr) => write!(f, "{}", addr),
        }
    }
}

impl FromStr for NatConfig {
    type Err = ParseNatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(NatConfig::None),
            "*" => Ok(NatConfig::Auto),
            other => match other.parse::<Multiaddr>() {
                Ok(addr) if !addr.is_empty() => Ok(NatConfig::Manual(addr)),
                _ => Err(ParseNatError(other.to_string())),
            },
        }
    }
}
