//! Neighbor selection: parameters, the interface the rest of the node uses,
//! and a local neighbor book that publishes selection events.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use auto_impl::auto_impl;
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::events::{DroppedEvent, PeeringEvent, SaltUpdatedEvent, SelectionEvents};
use crate::identity::PeerId;
use crate::peer::AutopeeredPeer;
use crate::salt::{MAX_SALT_LIFETIME, Salt};

/// Interval between outbound neighbor updates.
pub const OUTBOUND_UPDATE_INTERVAL: Duration = Duration::from_secs(30);

/// Interval between outbound updates once all outbound slots are filled.
pub const FULL_OUTBOUND_UPDATE_INTERVAL: Duration = Duration::from_secs(30);

/// Selection configuration knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionParameters {
    /// Number of accepted inbound neighbors.
    pub inbound_neighbor_size: usize,
    /// Number of chosen outbound neighbors.
    pub outbound_neighbor_size: usize,
    /// How long a salt stays valid before it is rotated.
    pub salt_lifetime: Duration,
    pub outbound_update_interval: Duration,
    pub full_outbound_update_interval: Duration,
}

impl Default for SelectionParameters {
    fn default() -> Self {
        Self::new(4, 4, 30)
    }
}

impl SelectionParameters {
    /// The salt lifetime is clamped to [`MAX_SALT_LIFETIME`].
    pub fn new(inbound: usize, outbound: usize, salt_lifetime_minutes: u64) -> Self {
        let salt_lifetime = Duration::from_secs(salt_lifetime_minutes.saturating_mul(60));
        Self {
            inbound_neighbor_size: inbound,
            outbound_neighbor_size: outbound,
            salt_lifetime: salt_lifetime.min(MAX_SALT_LIFETIME),
            outbound_update_interval: OUTBOUND_UPDATE_INTERVAL,
            full_outbound_update_interval: FULL_OUTBOUND_UPDATE_INTERVAL,
        }
    }
}

/// What the node needs from neighbor selection: its event channels and a
/// way to tell it a neighbor is gone.
#[auto_impl(&, Arc)]
pub trait NeighborSelection: Send + Sync + 'static {
    fn events(&self) -> &SelectionEvents;

    /// Stop treating `id` as an active neighbor.
    fn remove_neighbor(&self, id: &PeerId);
}

#[derive(Debug, Default)]
struct Neighborhood {
    inbound: HashMap<PeerId, AutopeeredPeer>,
    outbound: HashMap<PeerId, AutopeeredPeer>,
}

impl Neighborhood {
    fn contains(&self, id: &PeerId) -> bool {
        self.inbound.contains_key(id) || self.outbound.contains_key(id)
    }

    fn remove(&mut self, id: &PeerId) -> Option<AutopeeredPeer> {
        self.inbound.remove(id).or_else(|| self.outbound.remove(id))
    }
}

/// Local neighbor book with bounded inbound/outbound slots.
///
/// Ranking is not done here: callers report negotiation outcomes and the
/// book records accepted neighbors while slots remain, publishing the
/// matching peering event either way.
pub struct Selection {
    params: SelectionParameters,
    neighbors: RwLock<Neighborhood>,
    salt: RwLock<Salt>,
    events: SelectionEvents,
}

impl Selection {
    pub fn new(params: SelectionParameters) -> Self {
        Self::with_events(params, SelectionEvents::default())
    }

    pub fn with_events(params: SelectionParameters, events: SelectionEvents) -> Self {
        Self {
            salt: RwLock::new(Salt::new(params.salt_lifetime)),
            params,
            neighbors: RwLock::new(Neighborhood::default()),
            events,
        }
    }

    pub fn parameters(&self) -> &SelectionParameters {
        &self.params
    }

    /// Report an outgoing peering outcome. Returns the published status.
    pub fn outgoing_peering(&self, peer: AutopeeredPeer, accepted: bool) -> bool {
        let status = accepted && self.try_insert(peer.clone(), Direction::Outbound);
        self.events
            .outgoing_peering
            .emit(PeeringEvent { peer, status });
        status
    }

    /// Report an incoming peering outcome. Returns the published status.
    pub fn incoming_peering(&self, peer: AutopeeredPeer, accepted: bool) -> bool {
        let status = accepted && self.try_insert(peer.clone(), Direction::Inbound);
        self.events
            .incoming_peering
            .emit(PeeringEvent { peer, status });
        status
    }

    fn try_insert(&self, peer: AutopeeredPeer, direction: Direction) -> bool {
        let mut neighbors = self.neighbors.write();
        if neighbors.contains(peer.id()) {
            trace!(id = %peer.id(), "already a neighbor");
            return false;
        }
        let (slots, limit) = match direction {
            Direction::Inbound => (&mut neighbors.inbound, self.params.inbound_neighbor_size),
            Direction::Outbound => (&mut neighbors.outbound, self.params.outbound_neighbor_size),
        };
        if slots.len() >= limit {
            debug!(id = %peer.id(), ?direction, limit, "no free neighbor slot");
            return false;
        }
        slots.insert(*peer.id(), peer);
        true
    }

    pub fn is_neighbor(&self, id: &PeerId) -> bool {
        self.neighbors.read().contains(id)
    }

    pub fn inbound_neighbors(&self) -> Vec<AutopeeredPeer> {
        self.neighbors.read().inbound.values().cloned().collect()
    }

    pub fn outbound_neighbors(&self) -> Vec<AutopeeredPeer> {
        self.neighbors.read().outbound.values().cloned().collect()
    }

    pub fn neighbor_count(&self) -> usize {
        let neighbors = self.neighbors.read();
        neighbors.inbound.len() + neighbors.outbound.len()
    }

    pub fn salt(&self) -> Salt {
        self.salt.read().clone()
    }

    /// Replace the salt and publish `SaltUpdated`.
    pub fn update_salt(&self) -> Salt {
        let salt = Salt::new(self.params.salt_lifetime);
        *self.salt.write() = salt.clone();
        self.events.salt_updated.emit(SaltUpdatedEvent {
            public: salt.clone(),
        });
        salt
    }

    /// Refresh the salt every salt lifetime until `shutdown` fires. The first
    /// refresh happens immediately.
    pub async fn run(self: Arc<Self>, shutdown: CancellationToken) {
        let period = self.params.salt_lifetime.max(Duration::from_secs(1));
        let mut interval = tokio::time::interval(period);

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    debug!("selection received shutdown signal");
                    break;
                }

                _ = interval.tick() => {
                    self.update_salt();
                }
            }
        }
    }
}

impl NeighborSelection for Selection {
    fn events(&self) -> &SelectionEvents {
        &self.events
    }

    fn remove_neighbor(&self, id: &PeerId) {
        // Dropped is only published for actual neighbors, so repeated removals are silent.
        if self.neighbors.write().remove(id).is_none() {
            trace!(%id, "not a neighbor");
            return;
        }
        debug!(%id, "neighbor removed");
        self.events.dropped.emit(DroppedEvent { dropped_id: *id });
    }
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Inbound,
    Outbound,
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use super::*;
    use crate::service::{GOSSIP_SERVICE_KEY, ServiceMap};

    fn make_peer(n: u8) -> AutopeeredPeer {
        AutopeeredPeer::new(
            PeerId::new([n; 32]),
            IpAddr::V4(Ipv4Addr::new(10, 0, 0, n)),
            ServiceMap::new().with(GOSSIP_SERVICE_KEY, "tcp", 15600),
        )
    }

    #[test]
    fn test_default_parameters() {
        let params = SelectionParameters::default();
        assert_eq!(params.inbound_neighbor_size, 4);
        assert_eq!(params.outbound_neighbor_size, 4);
        assert_eq!(params.salt_lifetime, Duration::from_secs(30 * 60));
        assert_eq!(params.outbound_update_interval, Duration::from_secs(30));
        assert_eq!(params.full_outbound_update_interval, Duration::from_secs(30));
    }

    #[test]
    fn test_salt_lifetime_is_clamped() {
        let params = SelectionParameters::new(4, 4, 4_611_686_018_427_387_904);
        assert_eq!(params.salt_lifetime, MAX_SALT_LIFETIME);

        let params = SelectionParameters::new(4, 4, u64::MAX);
        assert_eq!(params.salt_lifetime, MAX_SALT_LIFETIME);
    }

    #[tokio::test]
    async fn test_outgoing_peering_respects_slots() {
        let selection = Selection::new(SelectionParameters::new(1, 1, 30));
        let mut rx = selection.events().outgoing_peering.subscribe();

        assert!(selection.outgoing_peering(make_peer(1), true));
        assert!(!selection.outgoing_peering(make_peer(2), true));

        assert!(rx.recv().await.unwrap().status);
        let rejected = rx.recv().await.unwrap();
        assert!(!rejected.status);
        assert_eq!(*rejected.peer.id(), PeerId::new([2; 32]));
        assert_eq!(selection.outbound_neighbors().len(), 1);
    }

    #[tokio::test]
    async fn test_rejected_peering_is_published() {
        let selection = Selection::new(SelectionParameters::default());
        let mut rx = selection.events().incoming_peering.subscribe();

        assert!(!selection.incoming_peering(make_peer(3), false));
        assert!(!rx.recv().await.unwrap().status);
        assert_eq!(selection.neighbor_count(), 0);
    }

    #[tokio::test]
    async fn test_remove_neighbor_drops_once() {
        let selection = Selection::new(SelectionParameters::default());
        let mut rx = selection.events().dropped.subscribe();
        selection.incoming_peering(make_peer(4), true);

        selection.remove_neighbor(&PeerId::new([4; 32]));
        selection.remove_neighbor(&PeerId::new([4; 32]));

        assert_eq!(rx.recv().await.unwrap().dropped_id, PeerId::new([4; 32]));
        assert!(rx.try_recv().is_err());
        assert!(!selection.is_neighbor(&PeerId::new([4; 32])));
    }

    #[test]
    fn test_peer_cannot_hold_two_slots() {
        let selection = Selection::new(SelectionParameters::default());
        assert!(selection.outgoing_peering(make_peer(5), true));
        assert!(!selection.incoming_peering(make_peer(5), true));
        assert_eq!(selection.neighbor_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_rotates_salt() {
        let selection = Arc::new(Selection::new(SelectionParameters::new(4, 4, 1)));
        let mut rx = selection.events().salt_updated.subscribe();
        let shutdown = CancellationToken::new();

        let task = tokio::spawn(Arc::clone(&selection).run(shutdown.clone()));

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_ne!(first.public, second.public);
        assert_eq!(selection.salt(), second.public);

        shutdown.cancel();
        task.await.unwrap();
    }
}
