//! Event handlers translating between autopeering and the connection manager.

use autopeer_autopeering::{
    AutopeeredPeer, DeletedEvent, DiscoveredEvent, DroppedEvent, NeighborSelection, PeeringEvent,
    SaltUpdatedEvent,
};
use autopeer_peering::{ConnectedPeer, ConnectionManager, PeeringError};
use tracing::{debug, error, info, warn};

use crate::endpoint::GossipEndpoint;

/// Resolve the gossip endpoint of `peer`, logging and returning `None` if
/// the peer advertises no gossip service.
fn gossip_endpoint(peer: &AutopeeredPeer, context: &'static str) -> Option<GossipEndpoint> {
    match GossipEndpoint::resolve(peer) {
        Ok(endpoint) => Some(endpoint),
        Err(err) => {
            warn!(
                id = %peer.id(),
                ip = %peer.ip(),
                %err,
                "[{context}] skipping peer without gossip endpoint"
            );
            None
        }
    }
}

pub fn on_peer_discovered(event: &DiscoveredEvent) {
    log_discovery(&event.peer, "discovered");
}

pub fn on_peer_deleted(event: &DeletedEvent) {
    log_discovery(&event.peer, "deleted");
}

fn log_discovery(peer: &AutopeeredPeer, what: &'static str) {
    match GossipEndpoint::resolve(peer) {
        Ok(endpoint) => {
            info!(address = %endpoint, id = %peer.id(), "[{what}] {endpoint} / {}", peer.id());
        }
        Err(_) => {
            let (ip, id) = (peer.ip(), peer.id());
            info!(%ip, %id, "[{what}] {ip} / {id} (no gossip service)");
        }
    }
}

pub fn on_salt_updated(event: &SaltUpdatedEvent) {
    info!(
        expiration = event.public.expiration_unix(),
        "public salt has been updated"
    );
}

/// Applies selection outcomes to the connection manager and reports
/// manager disconnects back to selection.
///
/// Handlers take `&self` and hold no locks; all mutation goes through the
/// manager's own synchronization.
pub struct PeerBridge<S, M> {
    selection: S,
    manager: M,
}

impl<S, M> PeerBridge<S, M>
where
    S: NeighborSelection,
    M: ConnectionManager,
{
    pub fn new(selection: S, manager: M) -> Self {
        Self { selection, manager }
    }

    pub fn selection(&self) -> &S {
        &self.selection
    }

    pub fn manager(&self) -> &M {
        &self.manager
    }

    /// An outgoing peering was accepted: register the peer for dialing.
    pub fn on_outgoing_peering(&self, event: &PeeringEvent) {
        if !event.status {
            return;
        }
        let Some(endpoint) = gossip_endpoint(&event.peer, "outgoing peering") else {
            return;
        };

        let id = event.peer.id();
        info!(address = %endpoint, %id, "[outgoing peering] adding autopeering peer");
        if let Err(err) = self
            .manager
            .add(&endpoint.to_string(), false, "", Some(event.peer.clone()))
        {
            warn!(address = %endpoint, %id, %err, "couldn't add autopeering peer");
        }
    }

    /// An incoming peering was accepted: whitelist the peer unless its
    /// address is already statically peered.
    pub fn on_incoming_peering(&self, event: &PeeringEvent) {
        if !event.status {
            return;
        }
        let Some(endpoint) = gossip_endpoint(&event.peer, "incoming peering") else {
            return;
        };

        let id = event.peer.id();
        let hosts = [endpoint.host()];
        if self.manager.is_statically_peered(&hosts, endpoint.port()) {
            info!(
                address = %endpoint,
                %id,
                "peer is already statically peered, removing autopeering entry"
            );
            match self.manager.remove(&endpoint.to_string()) {
                Ok(()) => {}
                // The static entry itself stays; nothing else was registered
                Err(PeeringError::StaticPrecedence(identity)) => {
                    debug!(address = %identity, %id, "static peer kept");
                }
                Err(err) => {
                    error!(address = %endpoint, %id, %err, "couldn't remove autopeering peer");
                }
            }
            return;
        }

        info!(address = %endpoint, %id, "[incoming peering] whitelisting");
        self.manager
            .whitelist(&hosts, endpoint.port(), Some(event.peer.clone()));
    }

    /// The manager lost a peer: autopeered peers stop being neighbors.
    pub fn on_peer_disconnected(&self, peer: &ConnectedPeer) {
        if peer.is_static() {
            return;
        }
        let Some(autopeering) = peer.autopeering() else {
            return;
        };

        info!(
            address = %peer.identity(),
            id = %autopeering.id(),
            "removing autopeering peer from neighbors"
        );
        self.selection.remove_neighbor(autopeering.id());
    }

    /// Selection dropped a neighbor: tear down its connection, if any.
    pub fn on_dropped(&self, event: &DroppedEvent) {
        let id = &event.dropped_id;
        debug!(%id, "[dropped event] trying to remove connection");

        let Some(peer) = self.manager.find_autopeered(id) else {
            warn!(%id, "didn't find autopeered peer for removal");
            return;
        };

        let address = peer.identity();
        info!(%address, %id, "removing autopeered peer");
        match self.manager.remove(address) {
            Ok(()) => info!(%address, %id, "disconnected autopeered peer"),
            Err(err) => error!(%address, %id, %err, "couldn't disconnect autopeered peer"),
        }
    }
}
