//! Connection manager events.

use std::sync::Arc;

use crate::peer::ConnectedPeer;

pub use autopeer_autopeering::EventEmitter;

#[derive(Debug, Clone)]
pub enum PeerEvent {
    /// A peer was registered (static on startup, added, or accepted inbound).
    Connected { peer: Arc<ConnectedPeer> },
    /// A peer's connection closed or failed. Autopeered peers are gone from
    /// the manager by the time this is seen; static peers stay registered.
    Disconnected { peer: Arc<ConnectedPeer> },
}

impl PeerEvent {
    pub fn peer(&self) -> &Arc<ConnectedPeer> {
        match self {
            Self::Connected { peer } | Self::Disconnected { peer } => peer,
        }
    }

    pub fn is_disconnect(&self) -> bool {
        matches!(self, Self::Disconnected { .. })
    }
}
