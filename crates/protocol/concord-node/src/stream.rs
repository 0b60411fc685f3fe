use concord_net::PeerStream;
use tracing::trace;

/// Close a finished stream. Failures only mean the remote already hung up.
pub(crate) async fn release(stream: PeerStream) {
    let peer = stream.peer();
    if let Err(e) = stream.close().await {
        trace!("closing stream to {}: {}", peer, e);
    }
}
