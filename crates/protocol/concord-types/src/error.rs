//! Error codes shared across Concord crates.
//!
//! Every crate-level error type maps onto one of these codes so the control
//! surface and the CLI can report failures uniformly.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Flat error taxonomy for node operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
#[non_exhaustive]
pub enum ErrorCode {
    // =========================================================================
    // Node State Errors (0x0001 - 0x00FF)
    // =========================================================================
    /// Operation requires the network but the node is offline
    NodeOffline = 0x0001,
    /// Operation requires a configured directory
    NoDirectory = 0x0002,
    /// Requested state is not a known node state
    BadState = 0x0003,

    // =========================================================================
    // Lookup Errors (0x0100 - 0x01FF)
    // =========================================================================
    /// The directory has no record of the peer
    UnknownPeer = 0x0100,
    /// Peer ID or address could not be parsed
    InvalidPeer = 0x0101,

    // =========================================================================
    // Wire Errors (0x0200 - 0x02FF)
    // =========================================================================
    /// Frame exceeds the maximum message size
    FrameTooLarge = 0x0200,
    /// Frame could not be decoded
    MalformedMessage = 0x0201,
    /// Signature did not verify
    InvalidSignature = 0x0202,

    // =========================================================================
    // Network Errors (0x0300 - 0x03FF)
    // =========================================================================
    /// Failed to reach the peer or open a stream
    ConnectionFailed = 0x0300,
    /// Deadline elapsed
    Timeout = 0x0301,
    /// Operation was cancelled
    Cancelled = 0x0302,

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// Configuration could not be loaded or saved
    ConfigError = 0xFFFE,
    /// Internal error
    InternalError = 0xFFFF,
}

impl ErrorCode {
    /// Get the numeric code value
    pub fn code(&self) -> u16 {
        *self as u16
    }

    /// Returns true if this is a network error (0x0300-0x03FF)
    pub fn is_network_error(&self) -> bool {
        (0x0300..=0x03FF).contains(&self.code())
    }

    /// Get a user-friendly suggestion for recovering from this error.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::NodeOffline => Some("Bring the node online with 'POST /status/online'."),
            Self::NoDirectory => Some("Configure a directory with 'POST /config/dir'."),
            Self::BadState => Some("Use one of: offline, online, public."),
            Self::UnknownPeer => Some("The peer is not registered with the directory. Ask it to go public."),
            Self::InvalidPeer => Some("Check the peer ID (base58) or handle (<multiaddr>/p2p/<peer-id>)."),
            Self::FrameTooLarge => Some("The peer sent an oversized message. Check protocol compatibility."),
            Self::MalformedMessage => Some("Message decoding failed. This may indicate a protocol mismatch."),
            Self::InvalidSignature => Some("Signature verification failed. Check the publisher key."),
            Self::ConnectionFailed => Some("Check network connectivity and that the peer is reachable."),
            Self::Timeout => Some("Operation timed out. Try again or check that the peer is online."),
            Self::Cancelled => None,
            Self::ConfigError => Some("Check the configuration file path and its contents."),
            Self::InternalError => Some("An internal error occurred. Please report this issue."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCode::NodeOffline => "NODE_OFFLINE",
            ErrorCode::NoDirectory => "NO_DIRECTORY",
            ErrorCode::BadState => "BAD_STATE",
            ErrorCode::UnknownPeer => "UNKNOWN_PEER",
            ErrorCode::InvalidPeer => "INVALID_PEER",
            ErrorCode::FrameTooLarge => "FRAME_TOO_LARGE",
            ErrorCode::MalformedMessage => "MALFORMED_MESSAGE",
            ErrorCode::InvalidSignature => "INVALID_SIGNATURE",
            ErrorCode::ConnectionFailed => "CONNECTION_FAILED",
            ErrorCode::Timeout => "TIMEOUT",
            ErrorCode::Cancelled => "CANCELLED",
            ErrorCode::ConfigError => "CONFIG_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        };
        f.write_str(name)
    }
}
