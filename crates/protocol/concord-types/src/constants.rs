//! Protocol constants.
//!
//! These constants are shared by the wire codec, the node lifecycle and the
//! control surface. Protocol IDs and the message bound are wire-visible and
//! must match every peer and directory on the network.

use std::time::Duration;

// =============================================================================
// Wire Limits
// =============================================================================

/// Maximum size of a single framed message payload: 2 MiB
pub const MAX_MESSAGE_SIZE: usize = 2 << 20;

/// Maximum length of an unsigned-varint length prefix
pub const MAX_VARINT_LEN: usize = 10;

// =============================================================================
// Protocol Endpoints
// =============================================================================

/// Liveness check: one `Ping` answered by one `Pong`, repeatable per stream
pub const PING_PROTOCOL: &str = "/mediachain/node/ping";

/// Directory registration heartbeat stream
pub const DIR_REGISTER_PROTOCOL: &str = "/mediachain/dir/register";

/// Directory lookup: one request, one response
pub const DIR_LOOKUP_PROTOCOL: &str = "/mediachain/dir/lookup";

/// Identify protocol version advertised by the node
pub const IDENTIFY_PROTOCOL_VERSION: &str = "/mediachain/node/1.0.0";

// =============================================================================
// Timing
// =============================================================================

/// Interval between registration heartbeats on an open directory stream
pub const REGISTER_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Delay before retrying a failed directory registration
pub const REGISTER_RETRY_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Deadline applied to control-surface pings
pub const PING_TIMEOUT: Duration = Duration::from_secs(30);

/// Idle connection timeout for the transport
pub const IDLE_CONNECTION_TIMEOUT: Duration = Duration::from_secs(60);

// =============================================================================
// Defaults
// =============================================================================

/// Default transport listen address
pub const DEFAULT_LISTEN_ADDRESS: &str = "/ip4/0.0.0.0/tcp/9001";

/// Default control surface bind address (loopback only)
pub const DEFAULT_CONTROL_ADDRESS: &str = "127.0.0.1:9002";
