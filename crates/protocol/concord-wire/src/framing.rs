//! Length-delimited message framing.
//!
//! A frame is an unsigned-varint payload length followed by the protobuf
//! payload, the same delimiting protobuf uses for `writeDelimited`. Reads and
//! writes are async over `futures::io` so they run directly on transport
//! streams.

use concord_types::constants::{MAX_MESSAGE_SIZE, MAX_VARINT_LEN};
use futures::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use prost::Message;
use std::io;

use crate::error::{WireError, WireResult};

/// Serialize `msg` and write it as one frame, then flush.
///
/// Fails with [`WireError::FrameTooLarge`] without writing anything if the
/// encoded payload exceeds [`MAX_MESSAGE_SIZE`].
pub async fn write_message<W, M>(io: &mut W, msg: &M) -> WireResult<()>
where
    W: AsyncWrite + Unpin + ?Sized,
    M: Message,
{
    let len = msg.encoded_len();
    if len > MAX_MESSAGE_SIZE {
        return Err(WireError::FrameTooLarge {
            size: len as u64,
            max: MAX_MESSAGE_SIZE,
        });
    }

    let frame = msg.encode_length_delimited_to_vec();
    io.write_all(&frame).await?;
    io.flush().await?;

    Ok(())
}

/// Read one frame and decode it as `M`.
///
/// - [`WireError::EndOfStream`] if the stream closes before the first prefix byte
/// - [`WireError::FrameTooLarge`] if the declared length exceeds `max_size`;
///   only the prefix has been consumed at that point
/// - [`WireError::Io`] with `UnexpectedEof` if the stream closes mid-frame
pub async fn read_message<R, M>(io: &mut R, max_size: usize) -> WireResult<M>
where
    R: AsyncRead + Unpin + ?Sized,
    M: Message + Default,
{
    let len = read_length_prefix(io).await?;
    if len > max_size as u64 {
        return Err(WireError::FrameTooLarge {
            size: len,
            max: max_size,
        });
    }

    let mut payload = vec![0u8; len as usize];
    io.read_exact(&mut payload).await?;

    Ok(M::decode(payload.as_slice())?)
}

/// Read an unsigned-varint length prefix one byte at a time.
///
/// Never reads past the last prefix byte. The tenth byte may only carry
/// bit 63; anything more overflows a u64 and is malformed.
async fn read_length_prefix<R>(io: &mut R) -> WireResult<u64>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut value: u64 = 0;
    for i in 0..MAX_VARINT_LEN {
        let mut byte = [0u8; 1];
        let n = io.read(&mut byte).await?;
        if n == 0 {
            if i == 0 {
                return Err(WireError::EndOfStream);
            }
            return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
        }

        if i == MAX_VARINT_LEN - 1 && byte[0] > 1 {
            return Err(WireError::MalformedLength);
        }

        value |= u64::from(byte[0] & 0x7f) << (7 * i);
        if byte[0] & 0x80 == 0 {
            return Ok(value);
        }
    }

    Err(WireError::MalformedLength)
}
