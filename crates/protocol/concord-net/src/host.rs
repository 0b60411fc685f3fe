//! The transport seam.
//!
//! The node speaks to the network only through [`Host`]. The production
//! implementation is [`Libp2pHost`](crate::Libp2pHost); tests substitute an
//! in-memory host.

use crate::error::NetworkResult;
use crate::identity::NodeIdentity;
use crate::peer_info::PeerAddressInfo;
use async_trait::async_trait;
use concord_wire::{WireResult, MAX_MESSAGE_SIZE};
use futures::future::BoxFuture;
use futures::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use libp2p::{Multiaddr, PeerId, StreamProtocol};
use prost::Message;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

// =============================================================================
// Streams
// =============================================================================

/// Byte-level duplex stream a [`PeerStream`] wraps.
pub trait StreamIo: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T> StreamIo for T where T: AsyncRead + AsyncWrite + Send + Unpin {}

/// A protocol stream to a remote peer.
///
/// Dropping the stream releases it. [`close`](Self::close) additionally
/// signals end-of-stream to the remote side.
pub struct PeerStream {
    peer: PeerId,
    protocol: StreamProtocol,
    io: Box<dyn StreamIo>,
}

impl PeerStream {
    pub fn new(peer: PeerId, protocol: StreamProtocol, io: impl StreamIo + 'static) -> Self {
        Self {
            peer,
            protocol,
            io: Box::new(io),
        }
    }

    /// The remote peer.
    pub fn peer(&self) -> PeerId {
        self.peer
    }

    pub fn protocol(&self) -> &StreamProtocol {
        &self.protocol
    }

    /// Read one framed message.
    pub async fn read_message<M: Message + Default>(&mut self) -> WireResult<M> {
        concord_wire::read_message(&mut self.io, MAX_MESSAGE_SIZE).await
    }

    /// Write one framed message.
    pub async fn write_message<M: Message>(&mut self, msg: &M) -> WireResult<()> {
        concord_wire::write_message(&mut self.io, msg).await
    }

    /// Close the write side and release the stream.
    pub async fn close(mut self) -> NetworkResult<()> {
        self.io.close().await?;
        Ok(())
    }
}

impl fmt::Debug for PeerStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeerStream")
            .field("peer", &self.peer)
            .field("protocol", &self.protocol)
            .finish_non_exhaustive()
    }
}

/// Handler invoked once per inbound stream, on its own task.
pub type StreamHandler = Arc<dyn Fn(PeerStream) -> BoxFuture<'static, ()> + Send + Sync>;

/// Build a [`StreamHandler`] from an async closure.
pub fn stream_handler<F, Fut>(f: F) -> StreamHandler
where
    F: Fn(PeerStream) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move |stream| Box::pin(f(stream)))
}

// =============================================================================
// Host
// =============================================================================

/// A running network host.
#[async_trait]
pub trait Host: Send + Sync {
    fn local_peer_id(&self) -> PeerId;

    /// Addresses the host is currently listening on.
    fn listen_addresses(&self) -> Vec<Multiaddr>;

    /// Addresses remote peers have observed this host at.
    fn external_addresses(&self) -> Vec<Multiaddr> {
        Vec::new()
    }

    /// Ensure a connection to `peer`, dialing its addresses if needed.
    async fn connect(&self, peer: &PeerAddressInfo) -> NetworkResult<()>;

    /// Open a new stream to a connected peer.
    async fn open_stream(&self, peer: PeerId, protocol: StreamProtocol)
        -> NetworkResult<PeerStream>;

    /// Install the handler for inbound streams of `protocol`.
    ///
    /// Must be called from within a tokio runtime.
    fn set_stream_handler(&self, protocol: StreamProtocol, handler: StreamHandler)
        -> NetworkResult<()>;

    /// Close all listeners and connections. Idempotent.
    async fn close(&self) -> NetworkResult<()>;
}

/// Constructs hosts. The node builds a fresh host every time it goes online.
#[async_trait]
pub trait HostFactory: Send + Sync {
    async fn create(
        &self,
        identity: &NodeIdentity,
        listen: &Multiaddr,
    ) -> NetworkResult<Arc<dyn Host>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use concord_wire::{Ping, Pong, WireError};
    use tokio_util::compat::TokioAsyncReadCompatExt;

    fn stream_pair() -> (PeerStream, PeerStream) {
        let (a, b) = tokio::io::duplex(1024);
        let protocol = StreamProtocol::new("/test/1");
        let peer_a = PeerId::random();
        let peer_b = PeerId::random();
        (
            PeerStream::new(peer_b, protocol.clone(), a.compat()),
            PeerStream::new(peer_a, protocol, b.compat()),
        )
    }

    #[tokio::test]
    async fn test_peer_stream_exchange() {
        let (mut left, mut right) = stream_pair();

        left.write_message(&Ping {}).await.unwrap();
        let _: Ping = right.read_message().await.unwrap();

        right.write_message(&Pong {}).await.unwrap();
        let _: Pong = left.read_message().await.unwrap();
    }

    #[tokio::test]
    async fn test_close_signals_end_of_stream() {
        let (left, mut right) = stream_pair();
        left.close().await.unwrap();

        let err = right.read_message::<Ping>().await.unwrap_err();
        assert!(matches!(err, WireError::EndOfStream));
    }

    #[tokio::test]
    async fn test_stream_handler_wrapper() {
        let (tx, rx) = tokio::sync::oneshot::channel();
        let tx = std::sync::Mutex::new(Some(tx));
        let handler = stream_handler(move |stream: PeerStream| {
            let sender = tx.lock().unwrap().take();
            async move {
                if let Some(sender) = sender {
                    let _ = sender.send(stream.peer());
                }
            }
        });

        let (left, _right) = stream_pair();
        let expected = left.peer();
        handler(left).await;
        assert_eq!(rx.await.unwrap(), expected);
    }
}
