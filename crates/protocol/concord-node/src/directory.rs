//! Directory client: lookup and heartbeat registration.
//!
//! Lookup is one request/response on a fresh `dir/lookup` stream.
//! Registration keeps a single `dir/register` stream open and writes a
//! `RegisterPeer` heartbeat on it every `register_interval`. A failed
//! attempt is retried after `retry_interval`, forever, until the network
//! context is cancelled.

use crate::error::{NodeError, NodeResult};
use crate::nat::{NatConfig, NatSlot};
use crate::slot::Slot;
use crate::stream::release;
use concord_net::{Host, PeerAddressInfo, PeerStream, StreamProtocol};
use concord_types::constants::{DIR_LOOKUP_PROTOCOL, DIR_REGISTER_PROTOCOL};
use concord_wire::{LookupPeerRequest, LookupPeerResponse, RegisterPeer};
use libp2p::{Multiaddr, PeerId};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// The configured directory, shared between the node and its registration task.
pub(crate) type DirectorySlot = Slot<Option<PeerAddressInfo>>;

// =============================================================================
// Lookup
// =============================================================================

/// Resolve `peer` through `directory`.
pub(crate) async fn lookup(
    host: &dyn Host,
    directory: &PeerAddressInfo,
    peer: PeerId,
) -> NodeResult<PeerAddressInfo> {
    host.connect(directory).await?;

    let mut stream = host
        .open_stream(directory.id, StreamProtocol::new(DIR_LOOKUP_PROTOCOL))
        .await?;
    stream
        .write_message(&LookupPeerRequest {
            id: peer.to_base58(),
        })
        .await?;
    let response: LookupPeerResponse = stream.read_message().await?;
    release(stream).await;

    let info = response.peer.ok_or(NodeError::UnknownPeer(peer))?;
    debug!("dir/lookup: {} has {} addresses", peer, info.addr.len());
    Ok(PeerAddressInfo::from_wire(&info)?)
}

// =============================================================================
// Registration
// =============================================================================

/// Background registration for one public period.
pub(crate) struct Registrar {
    pub(crate) host: Arc<dyn Host>,
    pub(crate) directory: DirectorySlot,
    pub(crate) nat: NatSlot,
    /// Advertised when the host has not reported any bound address yet.
    pub(crate) listen_address: Multiaddr,
    pub(crate) register_interval: Duration,
    pub(crate) retry_interval: Duration,
}

impl Registrar {
    /// Register until `ctx` is cancelled, retrying failed attempts.
    pub(crate) async fn run(self, ctx: CancellationToken) {
        loop {
            match self.register_once(&ctx).await {
                Ok(()) => break,
                Err(e) => warn!("Directory registration failed: {}", e),
            }

            tokio::select! {
                biased;
                _ = ctx.cancelled() => break,
                _ = tokio::time::sleep(self.retry_interval) => {
                    info!("Retrying to register with directory");
                }
            }
        }
        debug!("Registration stopped");
    }

    /// One registration session. `Ok` means it ran until cancelled.
    async fn register_once(&self, ctx: &CancellationToken) -> NodeResult<()> {
        let directory = self.directory.get().ok_or(NodeError::NoDirectory)?;

        let mut stream = tokio::select! {
            biased;
            _ = ctx.cancelled() => return Ok(()),
            opened = self.open(&directory) => opened?,
        };

        loop {
            let msg = RegisterPeer {
                info: Some(self.local_info().to_wire()),
            };

            debug!("Registering with directory {}", directory.id);
            tokio::select! {
                biased;
                _ = ctx.cancelled() => return Ok(()),
                written = stream.write_message(&msg) => written?,
            }

            tokio::select! {
                biased;
                _ = ctx.cancelled() => return Ok(()),
                _ = tokio::time::sleep(self.register_interval) => {}
            }
        }
    }

    async fn open(&self, directory: &PeerAddressInfo) -> NodeResult<PeerStream> {
        self.host.connect(directory).await?;
        let stream = self
            .host
            .open_stream(directory.id, StreamProtocol::new(DIR_REGISTER_PROTOCOL))
            .await?;
        Ok(stream)
    }

    /// This node's reachable addresses under the current NAT configuration.
    fn local_info(&self) -> PeerAddressInfo {
        let addrs = match self.nat.get() {
            NatConfig::None => self.bound_addresses(),
            NatConfig::Auto => {
                let observed = self.host.external_addresses();
                if observed.is_empty() {
                    self.bound_addresses()
                } else {
                    observed
                }
            }
            NatConfig::Manual(addr) => vec![addr],
        };
        PeerAddressInfo::new(self.host.local_peer_id(), addrs)
    }

    fn bound_addresses(&self) -> Vec<Multiaddr> {
        let mut addrs = self.host.listen_addresses();
        if addrs.is_empty() {
            addrs.push(self.listen_address.clone());
        }
        addrs
    }
}
