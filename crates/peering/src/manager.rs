//! In-memory connection manager.
//!
//! Peers live in an `Arc`-per-peer map keyed by canonical `host:port`
//! identity. Autopeered entries are also indexed by their discovery identity
//! in the same locked table, so the index and the map never disagree. An
//! autopeering identity is bound to at most one connection at a time.

use std::collections::HashMap;
use std::sync::Arc;

use autopeer_autopeering::{AutopeeredPeer, PeerId};
use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::{debug, trace};

use crate::address::{OriginAddress, normalize_host};
use crate::error::PeeringError;
use crate::events::{EventEmitter, PeerEvent};
use crate::peer::{ConnectedPeer, ConnectionOrigin, ConnectionState, PeerKind, StaticPeerEntry};
use crate::traits::ConnectionManager;

/// Connection manager configuration.
#[derive(Debug, Clone)]
pub struct PeeringManagerConfig {
    /// Peers registered on startup. Never displaced by autopeering.
    pub static_peers: Vec<StaticPeerEntry>,
    /// Broadcast channel capacity for peer events.
    pub event_channel_capacity: usize,
}

impl Default for PeeringManagerConfig {
    fn default() -> Self {
        Self {
            static_peers: Vec::new(),
            event_channel_capacity: 256,
        }
    }
}

#[derive(Debug, Default)]
struct PeerTable {
    by_identity: HashMap<String, Arc<ConnectedPeer>>,
    /// Autopeering identity of each autopeered entry.
    by_id: HashMap<PeerId, String>,
}

impl PeerTable {
    fn insert(&mut self, peer: Arc<ConnectedPeer>) {
        let identity = peer.identity().to_string();
        if let Some(autopeering) = peer.autopeering() {
            self.by_id.insert(*autopeering.id(), identity.clone());
        }
        self.by_identity.insert(identity, peer);
    }

    fn remove(&mut self, identity: &str) -> Option<Arc<ConnectedPeer>> {
        let peer = self.by_identity.remove(identity)?;
        if let Some(autopeering) = peer.autopeering() {
            self.by_id.remove(autopeering.id());
        }
        Some(peer)
    }

    fn statically_peered(&self, addresses: &[String], port: u16) -> bool {
        let addresses: Vec<String> = addresses.iter().map(|a| normalize_host(a)).collect();
        self.by_identity.values().any(|peer| match peer.kind() {
            PeerKind::Static(entry) => {
                entry.port == port && addresses.contains(&normalize_host(&entry.address))
            }
            _ => false,
        })
    }
}

pub struct PeeringManager {
    peers: RwLock<PeerTable>,
    /// Pre-authorized inbound addresses with their autopeering reference.
    whitelist: RwLock<HashMap<String, Option<AutopeeredPeer>>>,
    events: EventEmitter<PeerEvent>,
}

impl PeeringManager {
    /// Create a manager and register the configured static peers.
    pub fn new(config: PeeringManagerConfig) -> Result<Self, PeeringError> {
        let manager = Self::with_capacity(config.event_channel_capacity);

        for entry in config.static_peers {
            let comment = entry.alias.clone().unwrap_or_default();
            let peer = ConnectedPeer::new(
                entry.origin(),
                ConnectionOrigin::Outbound,
                PeerKind::Static(entry),
                comment,
            );
            manager.register(peer)?;
        }

        Ok(manager)
    }

    pub fn with_defaults() -> Self {
        Self::with_capacity(PeeringManagerConfig::default().event_channel_capacity)
    }

    fn with_capacity(event_channel_capacity: usize) -> Self {
        Self {
            peers: RwLock::new(PeerTable::default()),
            whitelist: RwLock::new(HashMap::new()),
            events: EventEmitter::new(event_channel_capacity),
        }
    }

    fn register(&self, peer: ConnectedPeer) -> Result<Arc<ConnectedPeer>, PeeringError> {
        let peer = Arc::new(peer);
        let identity = peer.identity().to_string();

        {
            let mut peers = self.peers.write();

            if let Some(autopeering) = peer.autopeering() {
                let origin: OriginAddress = identity.parse()?;
                if peers.statically_peered(&[origin.addr], origin.port) {
                    return Err(PeeringError::StaticPrecedence(identity));
                }
                if let Some(existing) = peers.by_id.get(autopeering.id()) {
                    return Err(PeeringError::AutopeerConnected {
                        id: *autopeering.id(),
                        identity: existing.clone(),
                    });
                }
            }

            if peers.by_identity.contains_key(&identity) {
                return Err(PeeringError::AlreadyRegistered(identity));
            }

            peers.insert(Arc::clone(&peer));
        }

        debug!(%identity, origin = ?peer.origin(), "peer registered");
        self.events.emit(PeerEvent::Connected {
            peer: Arc::clone(&peer),
        });

        Ok(peer)
    }

    fn canonical(identity: &str) -> Result<String, PeeringError> {
        Ok(identity.parse::<OriginAddress>()?.to_string())
    }

    pub fn is_whitelisted(&self, address: &str) -> bool {
        Self::canonical(address)
            .map(|key| self.whitelist.read().contains_key(&key))
            .unwrap_or(false)
    }

    /// Accept an inbound connection from `address`, consuming its whitelist
    /// entry.
    pub fn accept_inbound(&self, address: &str) -> Result<Arc<ConnectedPeer>, PeeringError> {
        let origin: OriginAddress = address.parse()?;
        let key = origin.to_string();

        let autopeering = self
            .whitelist
            .write()
            .remove(&key)
            .ok_or_else(|| PeeringError::NotWhitelisted(key.clone()))?;

        let kind = autopeering.map_or(PeerKind::Manual, PeerKind::Autopeered);
        let peer = self.register(ConnectedPeer::new(origin, ConnectionOrigin::Inbound, kind, ""))?;
        peer.set_connection_state(ConnectionState::Connected);

        Ok(peer)
    }

    /// The transport lost the connection to `identity`.
    ///
    /// Non-static peers are unregistered; static peers stay registered in
    /// the `Disconnected` state so they can be redialed. Either way a
    /// `Disconnected` event is published.
    pub fn on_connection_lost(&self, identity: &str) -> Option<Arc<ConnectedPeer>> {
        let key = Self::canonical(identity).ok()?;

        let peer = {
            let mut peers = self.peers.write();
            let peer = Arc::clone(peers.by_identity.get(&key)?);
            if !peer.is_static() {
                peers.remove(&key);
            }
            peer
        };

        peer.set_connection_state(ConnectionState::Disconnected);
        debug!(identity = %key, is_static = peer.is_static(), "connection lost");
        self.events.emit(PeerEvent::Disconnected {
            peer: Arc::clone(&peer),
        });

        Some(peer)
    }

    pub fn get_peer(&self, identity: &str) -> Option<Arc<ConnectedPeer>> {
        let key = Self::canonical(identity).ok()?;
        self.peers.read().by_identity.get(&key).map(Arc::clone)
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.get_peer(identity).is_some()
    }

    pub fn connected_count(&self) -> usize {
        self.peers.read().by_identity.len()
    }

    pub fn autopeered_count(&self) -> usize {
        self.peers.read().by_id.len()
    }

    pub fn static_count(&self) -> usize {
        self.peers
            .read()
            .by_identity
            .values()
            .filter(|peer| peer.is_static())
            .count()
    }

    pub fn snapshot(&self) -> Vec<Arc<ConnectedPeer>> {
        self.peers.read().by_identity.values().map(Arc::clone).collect()
    }
}

impl ConnectionManager for PeeringManager {
    fn add(
        &self,
        address: &str,
        is_static: bool,
        comment: &str,
        autopeering: Option<AutopeeredPeer>,
    ) -> Result<(), PeeringError> {
        let origin: OriginAddress = address.parse()?;

        let kind = match (autopeering, is_static) {
            (Some(autopeering), _) => PeerKind::Autopeered(autopeering),
            (None, true) => {
                PeerKind::Static(StaticPeerEntry::new(origin.addr.clone(), origin.port))
            }
            (None, false) => PeerKind::Manual,
        };

        let peer = self.register(ConnectedPeer::new(
            origin,
            ConnectionOrigin::Outbound,
            kind,
            comment,
        ))?;
        trace!(identity = peer.identity(), "dial scheduled");

        Ok(())
    }

    fn remove(&self, identity: &str) -> Result<(), PeeringError> {
        let key = Self::canonical(identity)?;

        let peer = {
            let mut peers = self.peers.write();
            match peers.by_identity.get(&key) {
                None => return Err(PeeringError::NotFound(key)),
                Some(peer) if peer.is_static() => return Err(PeeringError::StaticPrecedence(key)),
                Some(_) => {}
            }
            peers
                .remove(&key)
                .ok_or_else(|| PeeringError::NotFound(key.clone()))?
        };
        self.whitelist.write().remove(&key);

        peer.set_connection_state(ConnectionState::Disconnected);
        debug!(identity = %key, "peer removed");
        self.events.emit(PeerEvent::Disconnected { peer });

        Ok(())
    }

    fn whitelist(&self, addresses: &[String], port: u16, autopeering: Option<AutopeeredPeer>) {
        let allowed: Vec<OriginAddress> = addresses
            .iter()
            .map(|addr| OriginAddress::new(addr.as_str(), port))
            .filter(|origin| {
                let is_static = self.is_statically_peered(&[origin.addr.clone()], port);
                if is_static {
                    debug!(address = %origin, "not whitelisting statically peered address");
                }
                !is_static
            })
            .collect();

        let mut whitelist = self.whitelist.write();
        for origin in allowed {
            trace!(address = %origin, "whitelisted");
            whitelist.insert(origin.to_string(), autopeering.clone());
        }
    }

    fn is_statically_peered(&self, addresses: &[String], port: u16) -> bool {
        self.peers.read().statically_peered(addresses, port)
    }

    fn for_all_connected(&self, f: &mut dyn FnMut(&Arc<ConnectedPeer>) -> bool) {
        // Visit a snapshot so `f` may call back into the manager.
        for peer in self.snapshot() {
            if f(&peer) {
                break;
            }
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<PeerEvent> {
        self.events.subscribe()
    }

    fn find_autopeered(&self, id: &PeerId) -> Option<Arc<ConnectedPeer>> {
        let peers = self.peers.read();
        let identity = peers.by_id.get(id)?;
        peers.by_identity.get(identity).map(Arc::clone)
    }
}
