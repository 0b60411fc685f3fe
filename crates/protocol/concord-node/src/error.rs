//! Error types for the node layer.

use concord_net::NetworkError;
use concord_types::ErrorCode;
use concord_wire::WireError;
use libp2p::PeerId;
use std::time::Duration;
use thiserror::Error;

/// Result type for node operations.
pub type NodeResult<T> = std::result::Result<T, NodeError>;

/// Errors surfaced by the node lifecycle and its protocols.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum NodeError {
    // =========================================================================
    // State Errors
    // =========================================================================
    /// The operation needs the network but the node is offline.
    #[error("node is offline")]
    NodeOffline,

    /// The operation needs a directory but none is configured.
    #[error("no directory server")]
    NoDirectory,

    // =========================================================================
    // Protocol Errors
    // =========================================================================
    /// The directory has no record of the peer.
    #[error("unknown peer: {0}")]
    UnknownPeer(PeerId),

    /// The caller's deadline expired.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// Manifest signature or key ID did not verify.
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// Publisher key material could not be loaded.
    #[error("invalid publisher key: {0}")]
    InvalidKey(String),

    // =========================================================================
    // Lower-layer Errors
    // =========================================================================
    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error(transparent)]
    Wire(#[from] WireError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl NodeError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::NodeOffline => ErrorCode::NodeOffline,
            Self::NoDirectory => ErrorCode::NoDirectory,
            Self::UnknownPeer(_) => ErrorCode::UnknownPeer,
            Self::Timeout(_) => ErrorCode::Timeout,
            Self::InvalidSignature(_) => ErrorCode::InvalidSignature,
            Self::InvalidKey(_) => ErrorCode::ConfigError,
            Self::Network(e) => e.error_code(),
            Self::Wire(e) => e.error_code(),
            Self::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Returns true if retrying the same operation later may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            Self::Network(e) => e.is_transient(),
            Self::Wire(e) => matches!(e, WireError::Io(_) | WireError::EndOfStream),
            _ => false,
        }
    }

    /// Get a helpful suggestion for resolving this error.
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::NodeOffline => "Bring the node online first: POST /status/online.",
            Self::NoDirectory => "Configure a directory: POST /config/dir with its handle.",
            Self::UnknownPeer(_) => {
                "The directory has no record of this peer. It may not be public."
            }
            Self::Timeout(_) => "The peer did not answer in time. It may be unreachable.",
            Self::InvalidSignature(_) => "The manifest was not signed by the claimed publisher.",
            Self::InvalidKey(_) => "Regenerate the publisher key with 'concordd init --force'.",
            Self::Network(_) | Self::Wire(_) => {
                "Check network connectivity and that the peer is running."
            }
            Self::Internal(_) => "This is a bug. Please report it.",
        }
    }
}
