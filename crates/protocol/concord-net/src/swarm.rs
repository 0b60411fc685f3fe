//! libp2p implementation of [`Host`].
//!
//! The swarm runs on its own task. [`Libp2pHost`] talks to it over a command
//! channel for dials and shutdown; stream opening and accepting go through
//! the `libp2p-stream` control handle, which needs no round-trip through the
//! swarm task.

use crate::behaviour::{NodeBehaviour, NodeBehaviourEvent};
use crate::config::NetworkConfig;
use crate::error::{NetworkError, NetworkResult};
use crate::host::{Host, HostFactory, PeerStream, StreamHandler};
use crate::identity::NodeIdentity;
use crate::peer_info::PeerAddressInfo;
use crate::transport::build_transport;
use async_trait::async_trait;
use futures::StreamExt;
use libp2p::{
    identify,
    swarm::{dial_opts::DialOpts, SwarmEvent},
    Multiaddr, PeerId, StreamProtocol, Swarm,
};
use libp2p_stream::{Control, OpenStreamError};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

/// Commands sent to the swarm task.
enum SwarmCommand {
    /// Ensure a connection to a peer.
    Connect {
        peer: PeerAddressInfo,
        response: oneshot::Sender<NetworkResult<()>>,
    },

    /// Stop the swarm, closing listeners and connections.
    Shutdown { response: oneshot::Sender<()> },
}

type PendingDials = HashMap<PeerId, Vec<oneshot::Sender<NetworkResult<()>>>>;

/// Most external address candidates kept; older ones are dropped first.
const MAX_EXTERNAL_ADDRS: usize = 8;

/// Addresses reported by the swarm task.
#[derive(Debug, Default)]
struct AddressBook {
    listen: Vec<Multiaddr>,
    /// Addresses peers observed us at, most recent last.
    external: Vec<Multiaddr>,
}

impl AddressBook {
    fn add_external(&mut self, address: Multiaddr) {
        self.external.retain(|a| a != &address);
        self.external.push(address);
        if self.external.len() > MAX_EXTERNAL_ADDRS {
            self.external.remove(0);
        }
    }
}

type SharedAddressBook = Arc<RwLock<AddressBook>>;

// =============================================================================
// Host
// =============================================================================

/// A libp2p host: TCP/DNS + Noise + Yamux with raw protocol streams.
pub struct Libp2pHost {
    local_peer_id: PeerId,
    control: Control,
    command_tx: mpsc::Sender<SwarmCommand>,
    addresses: SharedAddressBook,
    shutdown: CancellationToken,
}

impl Libp2pHost {
    /// Build a host for `identity` and start listening on `listen`.
    pub async fn new(
        identity: &NodeIdentity,
        listen: &Multiaddr,
        config: &NetworkConfig,
    ) -> NetworkResult<Self> {
        let keypair = identity.keypair();
        let local_peer_id = identity.peer_id();

        let transport = build_transport(keypair, config.idle_connection_timeout)?;
        let behaviour = NodeBehaviour::new(keypair, config);
        let control = behaviour.stream.new_control();

        let swarm_config = libp2p::swarm::Config::with_tokio_executor()
            .with_idle_connection_timeout(config.idle_connection_timeout);
        let mut swarm = Swarm::new(transport, behaviour, local_peer_id, swarm_config);

        swarm.listen_on(listen.clone()).map_err(|e| {
            NetworkError::Transport(format!("failed to listen on {}: {}", listen, e))
        })?;

        let (command_tx, command_rx) = mpsc::channel(config.command_channel_capacity);
        let addresses = SharedAddressBook::default();
        let shutdown = CancellationToken::new();

        tokio::spawn(run_swarm(swarm, command_rx, Arc::clone(&addresses)));

        info!("Host {} started on {}", local_peer_id, listen);

        Ok(Self {
            local_peer_id,
            control,
            command_tx,
            addresses,
            shutdown,
        })
    }

    fn ensure_open(&self) -> NetworkResult<()> {
        if self.shutdown.is_cancelled() {
            return Err(NetworkError::HostClosed);
        }
        Ok(())
    }
}

#[async_trait]
impl Host for Libp2pHost {
    fn local_peer_id(&self) -> PeerId {
        self.local_peer_id
    }

    fn listen_addresses(&self) -> Vec<Multiaddr> {
        self.addresses
            .read()
            .map(|book| book.listen.clone())
            .unwrap_or_default()
    }

    fn external_addresses(&self) -> Vec<Multiaddr> {
        self.addresses
            .read()
            .map(|book| book.external.clone())
            .unwrap_or_default()
    }

    async fn connect(&self, peer: &PeerAddressInfo) -> NetworkResult<()> {
        self.ensure_open()?;

        let (tx, rx) = oneshot::channel();
        self.command_tx
            .send(SwarmCommand::Connect {
                peer: peer.clone(),
                response: tx,
            })
            .await
            .map_err(|_| NetworkError::ChannelClosed)?;

        rx.await.map_err(|_| NetworkError::ChannelClosed)?
    }

    async fn open_stream(
        &self,
        peer: PeerId,
        protocol: StreamProtocol,
    ) -> NetworkResult<PeerStream> {
        self.ensure_open()?;

        let mut control = self.control.clone();
        let stream = control
            .open_stream(peer, protocol.clone())
            .await
            .map_err(|e| match e {
                OpenStreamError::UnsupportedProtocol(p) => {
                    NetworkError::UnsupportedProtocol(p.to_string())
                }
                other => NetworkError::StreamOpen(other.to_string()),
            })?;

        trace!("Opened {} stream to {}", protocol, peer);
        Ok(PeerStream::new(peer, protocol, stream))
    }

    fn set_stream_handler(
        &self,
        protocol: StreamProtocol,
        handler: StreamHandler,
    ) -> NetworkResult<()> {
        self.ensure_open()?;

        let mut control = self.control.clone();
        let mut incoming = control
            .accept(protocol.clone())
            .map_err(|_| NetworkError::HandlerAlreadyRegistered(protocol.to_string()))?;

        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    next = incoming.next() => {
                        let Some((peer, stream)) = next else { break };
                        trace!("Inbound {} stream from {}", protocol, peer);
                        let stream = PeerStream::new(peer, protocol.clone(), stream);
                        tokio::spawn(handler(stream));
                    }
                }
            }
            debug!("Stopped accepting {} streams", protocol);
        });

        Ok(())
    }

    async fn close(&self) -> NetworkResult<()> {
        if self.shutdown.is_cancelled() {
            return Ok(());
        }
        self.shutdown.cancel();

        let (tx, rx) = oneshot::channel();
        if self
            .command_tx
            .send(SwarmCommand::Shutdown { response: tx })
            .await
            .is_ok()
        {
            // Swarm task already gone if this fails
            let _ = rx.await;
        }

        info!("Host {} closed", self.local_peer_id);
        Ok(())
    }
}

/// Creates [`Libp2pHost`]s from a shared [`NetworkConfig`].
#[derive(Debug, Clone, Default)]
pub struct Libp2pHostFactory {
    config: NetworkConfig,
}

impl Libp2pHostFactory {
    pub fn new(config: NetworkConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl HostFactory for Libp2pHostFactory {
    async fn create(
        &self,
        identity: &NodeIdentity,
        listen: &Multiaddr,
    ) -> NetworkResult<Arc<dyn Host>> {
        let host = Libp2pHost::new(identity, listen, &self.config).await?;
        Ok(Arc::new(host))
    }
}

// =============================================================================
// Swarm task
// =============================================================================

/// Run the swarm event loop until shutdown.
async fn run_swarm(
    mut swarm: Swarm<NodeBehaviour>,
    mut command_rx: mpsc::Receiver<SwarmCommand>,
    addresses: SharedAddressBook,
) {
    let mut pending_dials: PendingDials = HashMap::new();
    let mut shutdown_ack = None;

    loop {
        tokio::select! {
            event = swarm.select_next_some() => {
                handle_swarm_event(event, &mut pending_dials, &addresses);
            }

            command = command_rx.recv() => match command {
                Some(SwarmCommand::Connect { peer, response }) => {
                    start_dial(&mut swarm, peer, response, &mut pending_dials);
                }
                Some(SwarmCommand::Shutdown { response }) => {
                    shutdown_ack = Some(response);
                    break;
                }
                // Host dropped without close
                None => break,
            },
        }
    }

    for (_, waiters) in pending_dials.drain() {
        for waiter in waiters {
            let _ = waiter.send(Err(NetworkError::HostClosed));
        }
    }

    // Dropping the swarm closes every listener and connection
    drop(swarm);
    debug!("Swarm task stopped");

    if let Some(ack) = shutdown_ack {
        let _ = ack.send(());
    }
}

fn start_dial(
    swarm: &mut Swarm<NodeBehaviour>,
    peer: PeerAddressInfo,
    response: oneshot::Sender<NetworkResult<()>>,
    pending: &mut PendingDials,
) {
    if swarm.is_connected(&peer.id) {
        let _ = response.send(Ok(()));
        return;
    }

    if let Some(waiters) = pending.get_mut(&peer.id) {
        waiters.push(response);
        return;
    }

    debug!("Dialing {} at {:?}", peer.id, peer.addrs);
    let opts = DialOpts::peer_id(peer.id).addresses(peer.addrs).build();
    match swarm.dial(opts) {
        Ok(()) => {
            pending.insert(peer.id, vec![response]);
        }
        Err(e) => {
            let _ = response.send(Err(NetworkError::DialError(e.to_string())));
        }
    }
}

fn resolve_dials(pending: &mut PendingDials, peer: &PeerId, result: impl Fn() -> NetworkResult<()>) {
    if let Some(waiters) = pending.remove(peer) {
        for waiter in waiters {
            let _ = waiter.send(result());
        }
    }
}

fn handle_swarm_event(
    event: SwarmEvent<NodeBehaviourEvent>,
    pending_dials: &mut PendingDials,
    addresses: &RwLock<AddressBook>,
) {
    match event {
        SwarmEvent::ConnectionEstablished {
            peer_id,
            num_established,
            ..
        } => {
            debug!(
                "Connection established with {} (total: {})",
                peer_id, num_established
            );
            resolve_dials(pending_dials, &peer_id, || Ok(()));
        }

        SwarmEvent::OutgoingConnectionError {
            peer_id: Some(peer_id),
            error,
            ..
        } => {
            warn!("Failed to connect to {}: {}", peer_id, error);
            let reason = error.to_string();
            resolve_dials(pending_dials, &peer_id, || {
                Err(NetworkError::ConnectionFailed(reason.clone()))
            });
        }

        SwarmEvent::ConnectionClosed {
            peer_id,
            num_established,
            cause,
            ..
        } => {
            debug!(
                "Connection closed with {} (remaining: {}, cause: {:?})",
                peer_id, num_established, cause
            );
        }

        SwarmEvent::NewListenAddr { address, .. } => {
            info!("Listening on {}", address);
            if let Ok(mut book) = addresses.write() {
                book.listen.push(address);
            }
        }

        SwarmEvent::ExpiredListenAddr { address, .. } => {
            debug!("Listen address expired: {}", address);
            if let Ok(mut book) = addresses.write() {
                book.listen.retain(|a| a != &address);
            }
        }

        SwarmEvent::NewExternalAddrCandidate { address }
        | SwarmEvent::ExternalAddrConfirmed { address } => {
            debug!("External address {}", address);
            if let Ok(mut book) = addresses.write() {
                book.add_external(address);
            }
        }

        SwarmEvent::ExternalAddrExpired { address } => {
            if let Ok(mut book) = addresses.write() {
                book.external.retain(|a| a != &address);
            }
        }

        SwarmEvent::Behaviour(NodeBehaviourEvent::Identify(identify::Event::Received {
            peer_id,
            info,
            ..
        })) => {
            trace!(
                "Identified {} ({}) with {} addresses",
                peer_id,
                info.agent_version,
                info.listen_addrs.len()
            );
        }

        _ => {}
    }
}
