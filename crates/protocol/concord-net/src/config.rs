//! Network configuration.

use concord_types::constants::{IDENTIFY_PROTOCOL_VERSION, IDLE_CONNECTION_TIMEOUT};
use std::time::Duration;

/// Configuration for the libp2p host.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Idle connection timeout.
    ///
    /// Default: 60 seconds.
    pub idle_connection_timeout: Duration,

    /// Capacity of the command channel into the swarm task.
    ///
    /// Default: 256.
    pub command_channel_capacity: usize,

    /// Protocol version advertised over Identify.
    ///
    /// Default: "/mediachain/node/1.0.0".
    pub identify_protocol_version: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            idle_connection_timeout: IDLE_CONNECTION_TIMEOUT,
            command_channel_capacity: 256,
            identify_protocol_version: IDENTIFY_PROTOCOL_VERSION.to_string(),
        }
    }
}

impl NetworkConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the idle connection timeout.
    pub fn with_idle_connection_timeout(mut self, timeout: Duration) -> Self {
        self.idle_connection_timeout = timeout;
        self
    }

    /// Set the command channel capacity.
    pub fn with_command_channel_capacity(mut self, capacity: usize) -> Self {
        self.command_channel_capacity = capacity;
        self
    }
}
