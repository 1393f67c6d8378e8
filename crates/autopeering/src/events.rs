//! Discovery and selection events, and the non-blocking broadcast emitter
//! that carries them.
//!
//! Each event kind travels on its own typed channel. Subscribers only see
//! events published after they subscribed; there is no replay.

use std::fmt::Debug;

use tokio::sync::broadcast;

use crate::identity::PeerId;
use crate::peer::AutopeeredPeer;
use crate::salt::Salt;

const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Non-blocking broadcast emitter. Slow subscribers drop events independently.
#[derive(Debug)]
pub struct EventEmitter<E> {
    tx: broadcast::Sender<E>,
}

impl<E> Clone for EventEmitter<E> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<E: Clone> Default for EventEmitter<E> {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

impl<E: Clone> EventEmitter<E> {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn emit(&self, event: E) {
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<E> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// A new peer was found by discovery.
#[derive(Debug, Clone)]
pub struct DiscoveredEvent {
    pub peer: AutopeeredPeer,
}

/// A peer was removed from discovery as offline.
#[derive(Debug, Clone)]
pub struct DeletedEvent {
    pub peer: AutopeeredPeer,
}

/// Selection rotated its public salt.
#[derive(Debug, Clone)]
pub struct SaltUpdatedEvent {
    pub public: Salt,
}

/// Outcome of an outgoing or incoming peering negotiation.
#[derive(Debug, Clone)]
pub struct PeeringEvent {
    pub peer: AutopeeredPeer,
    /// `true` if the peering was accepted.
    pub status: bool,
}

/// A neighbor was dropped by selection. Only the identity is carried.
#[derive(Debug, Clone)]
pub struct DroppedEvent {
    pub dropped_id: PeerId,
}

/// Channels published by peer discovery.
#[derive(Debug, Clone)]
pub struct DiscoveryEvents {
    pub peer_discovered: EventEmitter<DiscoveredEvent>,
    pub peer_deleted: EventEmitter<DeletedEvent>,
}

impl Default for DiscoveryEvents {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

impl DiscoveryEvents {
    pub fn new(capacity: usize) -> Self {
        Self {
            peer_discovered: EventEmitter::new(capacity),
            peer_deleted: EventEmitter::new(capacity),
        }
    }
}

/// Channels published by neighbor selection.
#[derive(Debug, Clone)]
pub struct SelectionEvents {
    pub salt_updated: EventEmitter<SaltUpdatedEvent>,
    pub outgoing_peering: EventEmitter<PeeringEvent>,
    pub incoming_peering: EventEmitter<PeeringEvent>,
    pub dropped: EventEmitter<DroppedEvent>,
}

impl Default for SelectionEvents {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

impl SelectionEvents {
    pub fn new(capacity: usize) -> Self {
        Self {
            salt_updated: EventEmitter::new(capacity),
            outgoing_peering: EventEmitter::new(capacity),
            incoming_peering: EventEmitter::new(capacity),
            dropped: EventEmitter::new(capacity),
        }
    }
}
