//! In-memory implementation of the `Host` seam.
//!
//! Every host created through one [`MemoryNetwork`] can reach every other
//! open host on it. Streams are `tokio::io::duplex` pipes; inbound streams
//! run the target host's handler on a task that is aborted when that host
//! closes.

use async_trait::async_trait;
use concord_net::{
    Host, HostFactory, NetworkError, NetworkResult, NodeIdentity, PeerAddressInfo, PeerStream,
    StreamHandler,
};
use libp2p::{multiaddr::Protocol, Multiaddr, PeerId, StreamProtocol};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::task::AbortHandle;
use tokio_util::compat::TokioAsyncReadCompatExt;
use tokio_util::sync::CancellationToken;

use crate::helpers::memory_addr;

/// Buffer size of each in-memory pipe.
const PIPE_CAPACITY: usize = 64 * 1024;

struct HostShared {
    peer_id: PeerId,
    addrs: Vec<Multiaddr>,
    handlers: Mutex<HashMap<StreamProtocol, StreamHandler>>,
    connected: Mutex<HashSet<PeerId>>,
    inbound_tasks: Mutex<Vec<AbortHandle>>,
    shutdown: CancellationToken,
}

impl HostShared {
    fn is_closed(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    fn handler(&self, protocol: &StreamProtocol) -> Option<StreamHandler> {
        self.handlers.lock().unwrap().get(protocol).cloned()
    }

    fn spawn_inbound(&self, stream: PeerStream, handler: StreamHandler) {
        let task = tokio::spawn(handler(stream));
        let mut tasks = self.inbound_tasks.lock().unwrap();
        tasks.retain(|t| !t.is_finished());
        tasks.push(task.abort_handle());
    }
}

#[derive(Default)]
struct MemoryNetworkInner {
    hosts: HashMap<PeerId, Arc<HostShared>>,
    next_port: u64,
    fail_next_create: Option<String>,
    created: usize,
    connect_attempts: HashMap<PeerId, usize>,
    observed: HashMap<PeerId, Vec<Multiaddr>>,
}

/// An in-process network of [`MemoryHost`]s.
///
/// Cheap to clone; all clones share the same state.
#[derive(Clone, Default)]
pub struct MemoryNetwork {
    inner: Arc<Mutex<MemoryNetworkInner>>,
}

impl MemoryNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `create` call fail with a transport error.
    pub fn fail_next_create(&self, reason: impl Into<String>) {
        self.inner.lock().unwrap().fail_next_create = Some(reason.into());
    }

    /// Total number of hosts ever created on this network.
    pub fn hosts_created(&self) -> usize {
        self.inner.lock().unwrap().created
    }

    /// Number of hosts that are currently open.
    pub fn open_hosts(&self) -> usize {
        self.inner.lock().unwrap().hosts.len()
    }

    /// How many times any host tried to connect to `peer`.
    pub fn connect_attempts(&self, peer: &PeerId) -> usize {
        self.inner
            .lock()
            .unwrap()
            .connect_attempts
            .get(peer)
            .copied()
            .unwrap_or(0)
    }

    /// Whether a host for `peer` is open on this network.
    pub fn is_open(&self, peer: &PeerId) -> bool {
        self.inner.lock().unwrap().hosts.contains_key(peer)
    }

    /// Report `addrs` as the external addresses of `peer`'s host.
    pub fn set_observed_addresses(&self, peer: &PeerId, addrs: Vec<Multiaddr>) {
        self.inner.lock().unwrap().observed.insert(*peer, addrs);
    }

    /// Create and register a host directly.
    pub fn spawn_host(&self, identity: &NodeIdentity, listen: &Multiaddr) -> NetworkResult<MemoryHost> {
        let mut inner = self.inner.lock().unwrap();

        if let Some(reason) = inner.fail_next_create.take() {
            return Err(NetworkError::Transport(reason));
        }

        let peer_id = identity.peer_id();
        if inner.hosts.contains_key(&peer_id) {
            return Err(NetworkError::Transport(format!(
                "host {} is already running",
                peer_id
            )));
        }

        let addr = match listen.iter().next() {
            Some(Protocol::Memory(port)) if port != 0 => listen.clone(),
            _ => {
                inner.next_port += 1;
                memory_addr(inner.next_port)
            }
        };

        let shared = Arc::new(HostShared {
            peer_id,
            addrs: vec![addr],
            handlers: Mutex::new(HashMap::new()),
            connected: Mutex::new(HashSet::new()),
            inbound_tasks: Mutex::new(Vec::new()),
            shutdown: CancellationToken::new(),
        });
        inner.hosts.insert(peer_id, Arc::clone(&shared));
        inner.created += 1;

        Ok(MemoryHost {
            shared,
            network: self.clone(),
        })
    }

    fn record_connect(&self, peer: &PeerId) {
        *self
            .inner
            .lock()
            .unwrap()
            .connect_attempts
            .entry(*peer)
            .or_default() += 1;
    }

    fn find(&self, peer: &PeerId) -> Option<Arc<HostShared>> {
        self.inner.lock().unwrap().hosts.get(peer).cloned()
    }

    fn remove(&self, peer: &PeerId) {
        self.inner.lock().unwrap().hosts.remove(peer);
    }
}

#[async_trait]
impl HostFactory for MemoryNetwork {
    async fn create(
        &self,
        identity: &NodeIdentity,
        listen: &Multiaddr,
    ) -> NetworkResult<Arc<dyn Host>> {
        let host = self.spawn_host(identity, listen)?;
        Ok(Arc::new(host))
    }
}

/// A host on a [`MemoryNetwork`].
#[derive(Clone)]
pub struct MemoryHost {
    shared: Arc<HostShared>,
    network: MemoryNetwork,
}

impl MemoryHost {
    /// Peer info other hosts can use to reach this one.
    pub fn address_info(&self) -> PeerAddressInfo {
        PeerAddressInfo::new(self.shared.peer_id, self.shared.addrs.clone())
    }

    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }

    fn ensure_open(&self) -> NetworkResult<()> {
        if self.shared.is_closed() {
            return Err(NetworkError::HostClosed);
        }
        Ok(())
    }
}

#[async_trait]
impl Host for MemoryHost {
    fn local_peer_id(&self) -> PeerId {
        self.shared.peer_id
    }

    fn listen_addresses(&self) -> Vec<Multiaddr> {
        self.shared.addrs.clone()
    }

    fn external_addresses(&self) -> Vec<Multiaddr> {
        self.network
            .inner
            .lock()
            .unwrap()
            .observed
            .get(&self.shared.peer_id)
            .cloned()
            .unwrap_or_default()
    }

    async fn connect(&self, peer: &PeerAddressInfo) -> NetworkResult<()> {
        self.ensure_open()?;
        self.network.record_connect(&peer.id);

        let remote = self
            .network
            .find(&peer.id)
            .filter(|remote| !remote.is_closed())
            .ok_or_else(|| NetworkError::ConnectionFailed(format!("{} unreachable", peer.id)))?;

        let reachable =
            peer.addrs.is_empty() || peer.addrs.iter().any(|a| remote.addrs.contains(a));
        if !reachable {
            return Err(NetworkError::ConnectionFailed(format!(
                "no route to {} at {:?}",
                peer.id, peer.addrs
            )));
        }

        self.shared.connected.lock().unwrap().insert(peer.id);
        remote.connected.lock().unwrap().insert(self.shared.peer_id);
        Ok(())
    }

    async fn open_stream(
        &self,
        peer: PeerId,
        protocol: StreamProtocol,
    ) -> NetworkResult<PeerStream> {
        self.ensure_open()?;

        if !self.shared.connected.lock().unwrap().contains(&peer) {
            return Err(NetworkError::StreamOpen(format!("not connected to {}", peer)));
        }

        let remote = self
            .network
            .find(&peer)
            .filter(|remote| !remote.is_closed())
            .ok_or_else(|| NetworkError::StreamOpen(format!("{} went away", peer)))?;

        let handler = remote
            .handler(&protocol)
            .ok_or_else(|| NetworkError::UnsupportedProtocol(protocol.to_string()))?;

        let (local, far) = tokio::io::duplex(PIPE_CAPACITY);
        let inbound = PeerStream::new(self.shared.peer_id, protocol.clone(), far.compat());
        remote.spawn_inbound(inbound, handler);

        Ok(PeerStream::new(peer, protocol, local.compat()))
    }

    fn set_stream_handler(
        &self,
        protocol: StreamProtocol,
        handler: StreamHandler,
    ) -> NetworkResult<()> {
        self.ensure_open()?;

        let mut handlers = self.shared.handlers.lock().unwrap();
        if handlers.contains_key(&protocol) {
            return Err(NetworkError::HandlerAlreadyRegistered(protocol.to_string()));
        }
        handlers.insert(protocol, handler);
        Ok(())
    }

    async fn close(&self) -> NetworkResult<()> {
        if self.shared.is_closed() {
            return Ok(());
        }
        self.shared.shutdown.cancel();

        for task in self.shared.inbound_tasks.lock().unwrap().drain(..) {
            task.abort();
        }
        self.shared.handlers.lock().unwrap().clear();
        self.shared.connected.lock().unwrap().clear();
        self.network.remove(&self.shared.peer_id);

        Ok(())
    }
}
