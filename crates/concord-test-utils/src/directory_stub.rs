//! A minimal directory server.
//!
//! Accepts `dir/register` heartbeat streams and `dir/lookup` request
//! streams. Every heartbeat is recorded in order and updates the entry
//! served to lookups.

use concord_net::{
    stream_handler, Host, NetworkResult, NodeIdentity, PeerAddressInfo, PeerStream, StreamProtocol,
};
use concord_types::constants::{DIR_LOOKUP_PROTOCOL, DIR_REGISTER_PROTOCOL};
use concord_wire::{LookupPeerRequest, LookupPeerResponse, PeerInfo, RegisterPeer};
use libp2p::PeerId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

use crate::helpers::memory_addr;
use crate::memory_network::{MemoryHost, MemoryNetwork};

#[derive(Default)]
struct DirectoryState {
    registrations: Vec<(PeerId, RegisterPeer)>,
    entries: HashMap<String, PeerInfo>,
}

/// A directory running on a [`MemoryNetwork`].
pub struct DirectoryStub {
    host: MemoryHost,
    state: Arc<Mutex<DirectoryState>>,
    count_rx: watch::Receiver<usize>,
}

impl DirectoryStub {
    /// Start a directory on `network`.
    pub fn spawn(network: &MemoryNetwork) -> NetworkResult<Self> {
        let host = network.spawn_host(&NodeIdentity::generate(), &memory_addr(0))?;
        let state = Arc::new(Mutex::new(DirectoryState::default()));
        let (count_tx, count_rx) = watch::channel(0usize);
        let count_tx = Arc::new(count_tx);

        let register_state = Arc::clone(&state);
        host.set_stream_handler(
            StreamProtocol::new(DIR_REGISTER_PROTOCOL),
            stream_handler(move |stream| {
                handle_register(stream, Arc::clone(&register_state), Arc::clone(&count_tx))
            }),
        )?;

        let lookup_state = Arc::clone(&state);
        host.set_stream_handler(
            StreamProtocol::new(DIR_LOOKUP_PROTOCOL),
            stream_handler(move |stream| handle_lookup(stream, Arc::clone(&lookup_state))),
        )?;

        Ok(Self {
            host,
            state,
            count_rx,
        })
    }

    pub fn peer_id(&self) -> PeerId {
        self.host.local_peer_id()
    }

    pub fn address_info(&self) -> PeerAddressInfo {
        self.host.address_info()
    }

    /// The `<multiaddr>/p2p/<id>` handle nodes are configured with.
    pub fn handle(&self) -> String {
        self.address_info().format_handle()
    }

    /// Serve `peer` to lookups without a registration.
    pub fn insert(&self, peer: &PeerAddressInfo) {
        let info = peer.to_wire();
        self.state
            .lock()
            .unwrap()
            .entries
            .insert(info.id.clone(), info);
    }

    /// All heartbeats received so far, in arrival order.
    pub fn registrations(&self) -> Vec<(PeerId, RegisterPeer)> {
        self.state.lock().unwrap().registrations.clone()
    }

    pub fn registration_count(&self) -> usize {
        *self.count_rx.borrow()
    }

    /// Wait until at least `n` heartbeats have arrived.
    pub async fn wait_for_registrations(&self, n: usize) {
        let mut rx = self.count_rx.clone();
        // The sender lives as long as the handlers, so this only fails after close
        let _ = rx.wait_for(|count| *count >= n).await;
    }

    /// Stop serving. Open streams are torn down.
    pub async fn close(&self) -> NetworkResult<()> {
        self.host.close().await
    }
}

async fn handle_register(
    mut stream: PeerStream,
    state: Arc<Mutex<DirectoryState>>,
    count_tx: Arc<watch::Sender<usize>>,
) {
    let remote = stream.peer();
    while let Ok(msg) = stream.read_message::<RegisterPeer>().await {
        {
            let mut state = state.lock().unwrap();
            if let Some(info) = &msg.info {
                state.entries.insert(info.id.clone(), info.clone());
            }
            state.registrations.push((remote, msg));
        }
        count_tx.send_modify(|count| *count += 1);
    }
}

async fn handle_lookup(mut stream: PeerStream, state: Arc<Mutex<DirectoryState>>) {
    while let Ok(request) = stream.read_message::<LookupPeerRequest>().await {
        let peer = state.lock().unwrap().entries.get(&request.id).cloned();
        if stream
            .write_message(&LookupPeerResponse { peer })
            .await
            .is_err()
        {
            break;
        }
    }
}
