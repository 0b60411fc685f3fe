//! Node configuration.

use crate::nat::NatConfig;
use concord_net::PeerAddressInfo;
use concord_types::constants::{REGISTER_INTERVAL, REGISTER_RETRY_INTERVAL};
use libp2p::{multiaddr::Protocol, Multiaddr};
use std::net::Ipv4Addr;
use std::time::Duration;

/// Configuration consumed by the lifecycle.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Address the host listens on when the node goes online.
    ///
    /// Default: `/ip4/0.0.0.0/tcp/9001`.
    pub listen_address: Multiaddr,

    /// Directory server, if any. Required to go public and to look peers up.
    pub directory: Option<PeerAddressInfo>,

    /// Which addresses registration advertises.
    ///
    /// Default: [`NatConfig::None`], the bound listen addresses.
    pub nat: NatConfig,

    /// Interval between registration heartbeats.
    ///
    /// Default: 5 minutes.
    pub register_interval: Duration,

    /// Wait before retrying a failed registration.
    ///
    /// Default: 5 minutes.
    pub retry_interval: Duration,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            listen_address: Multiaddr::empty()
                .with(Protocol::Ip4(Ipv4Addr::UNSPECIFIED))
                .with(Protocol::Tcp(9001)),
            directory: None,
            nat: NatConfig::None,
            register_interval: REGISTER_INTERVAL,
            retry_interval: REGISTER_RETRY_INTERVAL,
        }
    }
}

impl NodeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_listen_address(mut self, addr: Multiaddr) -> Self {
        self.listen_address = addr;
        self
    }

    pub fn with_directory(mut self, directory: PeerAddressInfo) -> Self {
        self.directory = Some(directory);
        self
    }

    pub fn with_nat(mut self, nat: NatConfig) -> Self {
        self.nat = nat;
        self
    }

    pub fn with_register_interval(mut self, interval: Duration) -> Self {
        self.register_interval = interval;
        self
    }

    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }
}
