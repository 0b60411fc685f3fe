//! The node lifecycle state machine.
//!
//! ```text
//! Offline --go_online--> Online --go_public--> Public
//! Offline --go_public--> Online --(auto)-----> Public
//! {Online, Public} --go_offline--> Offline
//! ```
//!
//! Presence is one owned record behind a single async mutex. A transition
//! holds the mutex while it checks the current state, brings the host up or
//! tears it down, and swaps in the new record. Protocol I/O (ping, lookup,
//! heartbeats) never runs under the mutex; callers take a clone of the host
//! handle and release the lock first.

use crate::config::NodeConfig;
use crate::directory::{self, DirectorySlot, Registrar};
use crate::error::{NodeError, NodeResult};
use crate::nat::{NatConfig, NatSlot};
use crate::ping;
use crate::publisher::PublisherIdentity;
use concord_net::{Host, HostFactory, NodeIdentity, PeerAddressInfo};
use concord_types::NodeStatus;
use concord_wire::Manifest;
use libp2p::{Multiaddr, PeerId};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// A running host and the network context every background task derives from.
struct Session {
    host: Arc<dyn Host>,
    ctx: CancellationToken,
}

/// The directory registration task of one public period.
struct Registration {
    task: JoinHandle<()>,
}

enum Presence {
    Offline,
    Online(Session),
    Public(Session, Registration),
}

impl Presence {
    fn status(&self) -> NodeStatus {
        match self {
            Presence::Offline => NodeStatus::Offline,
            Presence::Online(_) => NodeStatus::Online,
            Presence::Public(..) => NodeStatus::Public,
        }
    }

    fn session(&self) -> Option<&Session> {
        match self {
            Presence::Offline => None,
            Presence::Online(session) | Presence::Public(session, _) => Some(session),
        }
    }
}

/// A statement-network node.
pub struct Node {
    identity: NodeIdentity,
    publisher: PublisherIdentity,
    config: NodeConfig,
    directory: DirectorySlot,
    nat: NatSlot,
    host_factory: Arc<dyn HostFactory>,
    presence: Mutex<Presence>,
    status_tx: watch::Sender<NodeStatus>,
}

impl Node {
    /// Create an offline node.
    pub fn new(
        identity: NodeIdentity,
        publisher: PublisherIdentity,
        config: NodeConfig,
        host_factory: Arc<dyn HostFactory>,
    ) -> Self {
        let (status_tx, _) = watch::channel(NodeStatus::Offline);
        let directory = DirectorySlot::new(config.directory.clone());
        let nat = NatSlot::new(config.nat.clone());

        Self {
            identity,
            publisher,
            config,
            directory,
            nat,
            host_factory,
            presence: Mutex::new(Presence::Offline),
            status_tx,
        }
    }

    // =========================================================================
    // Identity
    // =========================================================================

    pub fn peer_id(&self) -> PeerId {
        self.identity.peer_id()
    }

    pub fn publisher(&self) -> &PublisherIdentity {
        &self.publisher
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Sign a fresh manifest binding this node's peer ID to its publisher.
    pub fn node_manifest(&self) -> NodeResult<Manifest> {
        self.publisher.node_manifest(&self.peer_id())
    }

    // =========================================================================
    // Directory
    // =========================================================================

    /// The configured directory, if any.
    pub fn directory(&self) -> Option<PeerAddressInfo> {
        self.directory.get()
    }

    /// Replace the directory. A running registration picks it up on its next
    /// attempt.
    pub fn set_directory(&self, directory: Option<PeerAddressInfo>) {
        match &directory {
            Some(dir) => info!("Directory set to {}", dir),
            None => info!("Directory cleared"),
        }
        self.directory.set(directory);
    }

    // =========================================================================
    // NAT
    // =========================================================================

    /// The current NAT configuration.
    pub fn nat(&self) -> NatConfig {
        self.nat.get()
    }

    /// Replace the NAT configuration. A running registration advertises the
    /// new addresses from its next heartbeat.
    pub fn set_nat(&self, nat: NatConfig) {
        info!("NAT configuration set to {}", nat);
        self.nat.set(nat);
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Current status, read under the lifecycle lock.
    pub async fn status(&self) -> NodeStatus {
        self.presence.lock().await.status()
    }

    /// Observe status changes without taking the lifecycle lock.
    pub fn subscribe_status(&self) -> watch::Receiver<NodeStatus> {
        self.status_tx.subscribe()
    }

    /// Addresses the host is bound to; empty when offline.
    pub async fn listen_addresses(&self) -> Vec<Multiaddr> {
        match self.presence.lock().await.session() {
            Some(session) => session.host.listen_addresses(),
            None => Vec::new(),
        }
    }

    /// Stop the network.
    ///
    /// Cancels the network context and waits for the registration task to
    /// finish before closing the host, so no heartbeat is sent after this
    /// returns. The node ends up offline even if closing the host fails.
    pub async fn go_offline(&self) -> NodeResult<()> {
        let mut presence = self.presence.lock().await;

        let (session, registration) =
            match std::mem::replace(&mut *presence, Presence::Offline) {
                Presence::Offline => return Ok(()),
                Presence::Online(session) => (session, None),
                Presence::Public(session, registration) => (session, Some(registration)),
            };

        session.ctx.cancel();
        if let Some(registration) = registration {
            if let Err(e) = registration.task.await {
                warn!("Registration task ended abnormally: {}", e);
            }
        }

        let closed = session.host.close().await;
        self.publish(NodeStatus::Offline);
        info!("Node is offline");

        closed.map_err(NodeError::from)
    }

    /// Start the network. A public node stays public.
    pub async fn go_online(&self) -> NodeResult<()> {
        let mut presence = self.presence.lock().await;
        if !matches!(*presence, Presence::Offline) {
            return Ok(());
        }

        *presence = Presence::Online(self.start_session().await?);
        self.publish(NodeStatus::Online);
        info!("Node is online");

        Ok(())
    }

    /// Start the network if needed and register with the directory.
    ///
    /// Fails with [`NodeError::NoDirectory`] before touching any state if no
    /// directory is configured. An unreachable directory does not fail the
    /// transition; registration keeps retrying in the background.
    pub async fn go_public(&self) -> NodeResult<()> {
        if self.directory().is_none() {
            return Err(NodeError::NoDirectory);
        }

        let mut presence = self.presence.lock().await;

        let session = match std::mem::replace(&mut *presence, Presence::Offline) {
            Presence::Offline => {
                let session = self.start_session().await?;
                self.publish(NodeStatus::Online);
                info!("Node is online");
                session
            }
            Presence::Online(session) => session,
            public @ Presence::Public(..) => {
                *presence = public;
                return Ok(());
            }
        };

        let registration = self.start_registration(&session);
        *presence = Presence::Public(session, registration);
        self.publish(NodeStatus::Public);
        info!("Node is public");

        Ok(())
    }

    async fn start_session(&self) -> NodeResult<Session> {
        let host = self
            .host_factory
            .create(&self.identity, &self.config.listen_address)
            .await?;

        if let Err(e) = host.set_stream_handler(ping::protocol(), ping::handler()) {
            // Never leave a half-started host behind
            if let Err(close_err) = host.close().await {
                warn!("Closing host after failed start: {}", close_err);
            }
            return Err(e.into());
        }

        Ok(Session {
            host,
            ctx: CancellationToken::new(),
        })
    }

    fn start_registration(&self, session: &Session) -> Registration {
        let registrar = Registrar {
            host: Arc::clone(&session.host),
            directory: self.directory.clone(),
            nat: self.nat.clone(),
            listen_address: self.config.listen_address.clone(),
            register_interval: self.config.register_interval,
            retry_interval: self.config.retry_interval,
        };

        Registration {
            task: tokio::spawn(registrar.run(session.ctx.clone())),
        }
    }

    fn publish(&self, status: NodeStatus) {
        self.status_tx.send_replace(status);
    }

    // =========================================================================
    // Protocols
    // =========================================================================

    /// Resolve `peer` through the directory within `timeout`.
    pub async fn lookup(&self, peer: PeerId, timeout: Duration) -> NodeResult<PeerAddressInfo> {
        let host = self.online_host().await?;
        let directory = self.directory().ok_or(NodeError::NoDirectory)?;

        with_deadline(timeout, directory::lookup(host.as_ref(), &directory, peer)).await
    }

    /// Look `peer` up and run one ping round trip, all within `timeout`.
    pub async fn ping(&self, peer: PeerId, timeout: Duration) -> NodeResult<()> {
        let host = self.online_host().await?;
        let directory = self.directory().ok_or(NodeError::NoDirectory)?;

        with_deadline(timeout, async {
            let info = directory::lookup(host.as_ref(), &directory, peer).await?;
            ping::ping(host.as_ref(), &info).await
        })
        .await
    }

    async fn online_host(&self) -> NodeResult<Arc<dyn Host>> {
        self.presence
            .lock()
            .await
            .session()
            .map(|session| Arc::clone(&session.host))
            .ok_or(NodeError::NodeOffline)
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        // Stop background registration even if nobody called go_offline
        if let Some(session) = self.presence.get_mut().session() {
            session.ctx.cancel();
        }
    }
}

async fn with_deadline<T>(
    timeout: Duration,
    fut: impl Future<Output = NodeResult<T>>,
) -> NodeResult<T> {
    tokio::time::timeout(timeout, fut)
        .await
        .map_err(|_| NodeError::Timeout(timeout))?
}
