//! The `/mediachain/node/ping` liveness protocol.
//!
//! The responder answers every `Ping` on a stream with a `Pong` until the
//! initiator closes the stream. The initiator sends exactly one round.

use crate::error::NodeResult;
use crate::stream::release;
use concord_net::{stream_handler, Host, PeerAddressInfo, PeerStream, StreamHandler, StreamProtocol};
use concord_types::constants::PING_PROTOCOL;
use concord_wire::{Ping, Pong};
use tracing::{debug, trace};

pub(crate) fn protocol() -> StreamProtocol {
    StreamProtocol::new(PING_PROTOCOL)
}

/// Inbound handler installed on every host the node brings up.
pub(crate) fn handler() -> StreamHandler {
    stream_handler(serve)
}

async fn serve(mut stream: PeerStream) {
    let peer = stream.peer();
    debug!("node/ping: new stream from {}", peer);

    loop {
        match stream.read_message::<Ping>().await {
            Ok(_) => {}
            Err(e) if e.is_end_of_stream() => break,
            Err(e) => {
                debug!("node/ping: read from {} failed: {}", peer, e);
                break;
            }
        }

        trace!("node/ping: ping from {}; ponging", peer);
        if let Err(e) = stream.write_message(&Pong {}).await {
            debug!("node/ping: write to {} failed: {}", peer, e);
            break;
        }
    }

    release(stream).await;
}

/// One ping round trip to `peer`.
pub(crate) async fn ping(host: &dyn Host, peer: &PeerAddressInfo) -> NodeResult<()> {
    host.connect(peer).await?;

    let mut stream = host.open_stream(peer.id, protocol()).await?;
    stream.write_message(&Ping {}).await?;
    let _pong: Pong = stream.read_message().await?;

    release(stream).await;
    Ok(())
}
