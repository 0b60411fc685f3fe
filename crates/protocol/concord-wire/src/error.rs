//! Error types for message framing.

use concord_types::ErrorCode;
use std::io;
use thiserror::Error;

/// Errors that can occur while reading or writing a frame.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WireError {
    /// The peer closed the stream cleanly with no partial frame pending.
    ///
    /// This is a termination signal for read loops rather than a failure.
    #[error("end of stream")]
    EndOfStream,

    /// Declared or encoded payload length exceeds the maximum.
    #[error("frame too large: {size} bytes exceeds maximum {max} bytes")]
    FrameTooLarge {
        /// Length of the offending payload
        size: u64,
        /// Maximum allowed length
        max: usize,
    },

    /// Length prefix is not a valid unsigned varint.
    #[error("malformed length prefix")]
    MalformedLength,

    /// Payload is not a valid protobuf encoding of the expected message.
    #[error("decode failed: {0}")]
    Decode(#[from] prost::DecodeError),

    /// Stream I/O failed, including EOF in the middle of a frame.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl WireError {
    /// Returns true if this is the clean end-of-stream signal.
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, Self::EndOfStream)
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::EndOfStream | Self::Io(_) => ErrorCode::ConnectionFailed,
            Self::FrameTooLarge { .. } => ErrorCode::FrameTooLarge,
            Self::MalformedLength | Self::Decode(_) => ErrorCode::MalformedMessage,
        }
    }
}

/// Result type alias using WireError.
pub type WireResult<T> = Result<T, WireError>;
