//! Network error types.

use concord_types::ErrorCode;
use concord_wire::WireError;
use thiserror::Error;

/// Network-specific errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum NetworkError {
    /// Transport construction or listen failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// Failed to connect to peer.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Dial could not be started.
    #[error("dial error: {0}")]
    DialError(String),

    /// Stream could not be opened.
    #[error("failed to open stream: {0}")]
    StreamOpen(String),

    /// Remote peer does not speak the protocol.
    #[error("protocol not supported by peer: {0}")]
    UnsupportedProtocol(String),

    /// A handler is already installed for the protocol.
    #[error("stream handler already registered for {0}")]
    HandlerAlreadyRegistered(String),

    /// Wire peer info could not be converted.
    #[error("invalid peer info: {0}")]
    InvalidPeerInfo(String),

    /// Peer handle could not be parsed.
    #[error("invalid peer handle: {0}")]
    InvalidHandle(String),

    /// Keypair could not be encoded or decoded.
    #[error("identity error: {0}")]
    Identity(String),

    /// The host has been closed.
    #[error("host closed")]
    HostClosed,

    /// Internal channel closed unexpectedly.
    #[error("channel closed")]
    ChannelClosed,

    /// Framing error on a stream.
    #[error(transparent)]
    Wire(#[from] WireError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl NetworkError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Transport(_) => ErrorCode::InternalError,
            Self::ConnectionFailed(_)
            | Self::DialError(_)
            | Self::StreamOpen(_)
            | Self::UnsupportedProtocol(_)
            | Self::HostClosed
            | Self::ChannelClosed
            | Self::Io(_) => ErrorCode::ConnectionFailed,
            Self::HandlerAlreadyRegistered(_) => ErrorCode::InternalError,
            Self::InvalidPeerInfo(_) | Self::InvalidHandle(_) => ErrorCode::InvalidPeer,
            Self::Identity(_) => ErrorCode::ConfigError,
            Self::Wire(e) => e.error_code(),
        }
    }

    /// Returns true if this error is transient and the operation may succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed(_)
                | Self::DialError(_)
                | Self::StreamOpen(_)
                | Self::Io(_)
                | Self::Wire(WireError::Io(_))
                | Self::Wire(WireError::EndOfStream)
        )
    }
}

/// Result type alias using NetworkError.
pub type NetworkResult<T> = Result<T, NetworkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = NetworkError::ConnectionFailed("no route".to_string());
        assert_eq!(err.to_string(), "connection failed: no route");

        let err = NetworkError::Wire(WireError::EndOfStream);
        assert_eq!(err.to_string(), "end of stream");
    }

    #[test]
    fn test_is_transient() {
        assert!(NetworkError::ConnectionFailed("x".into()).is_transient());
        assert!(NetworkError::StreamOpen("x".into()).is_transient());
        assert!(NetworkError::Wire(WireError::EndOfStream).is_transient());

        assert!(!NetworkError::HostClosed.is_transient());
        assert!(!NetworkError::InvalidHandle("x".into()).is_transient());
        assert!(!NetworkError::Wire(WireError::MalformedLength).is_transient());
    }

    #[test]
    fn test_error_code() {
        assert_eq!(
            NetworkError::DialError("x".into()).error_code(),
            ErrorCode::ConnectionFailed
        );
        assert_eq!(
            NetworkError::InvalidPeerInfo("x".into()).error_code(),
            ErrorCode::InvalidPeer
        );
        assert_eq!(
            NetworkError::Wire(WireError::FrameTooLarge { size: 9, max: 1 }).error_code(),
            ErrorCode::FrameTooLarge
        );
    }
}
