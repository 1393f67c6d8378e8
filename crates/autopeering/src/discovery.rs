//! Local registry of discovered peers.
//!
//! Stands in for the discovery protocol: callers feed it peers, it keeps the
//! set of known peers and publishes `PeerDiscovered`/`PeerDeleted`.

use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::trace;

use crate::events::{DeletedEvent, DiscoveredEvent, DiscoveryEvents};
use crate::identity::{Local, PeerId};
use crate::peer::AutopeeredPeer;

pub struct Discovery {
    local_id: PeerId,
    peers: RwLock<HashMap<PeerId, AutopeeredPeer>>,
    events: DiscoveryEvents,
}

impl Discovery {
    pub fn new(local: &Local) -> Self {
        Self::with_events(local, DiscoveryEvents::default())
    }

    pub fn with_events(local: &Local, events: DiscoveryEvents) -> Self {
        Self {
            local_id: local.id(),
            peers: RwLock::new(HashMap::new()),
            events,
        }
    }

    pub fn events(&self) -> &DiscoveryEvents {
        &self.events
    }

    /// Returns true if the peer was new. Our own identity is never recorded.
    pub fn add_peer(&self, peer: AutopeeredPeer) -> bool {
        if *peer.id() == self.local_id {
            trace!(id = %peer.id(), "ignoring local identity");
            return false;
        }

        {
            let mut peers = self.peers.write();
            if peers.contains_key(peer.id()) {
                return false;
            }
            peers.insert(*peer.id(), peer.clone());
        }

        self.events.peer_discovered.emit(DiscoveredEvent { peer });
        true
    }

    pub fn delete_peer(&self, id: &PeerId) -> Option<AutopeeredPeer> {
        let peer = self.peers.write().remove(id)?;
        self.events.peer_deleted.emit(DeletedEvent { peer: peer.clone() });
        Some(peer)
    }

    pub fn get_peer(&self, id: &PeerId) -> Option<AutopeeredPeer> {
        self.peers.read().get(id).cloned()
    }

    pub fn peer_count(&self) -> usize {
        self.peers.read().len()
    }
}
