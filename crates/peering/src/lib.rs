//! Connection manager owning the authoritative set of gossip connections.
//!
//! Connections are either configured static peers or peers handed over by
//! autopeering. Static peers always take precedence: an autopeered address
//! that collides with a static entry is never registered or whitelisted.

pub mod address;
pub mod error;
pub mod events;
pub mod manager;
pub mod peer;
pub mod traits;

pub use address::OriginAddress;
pub use error::PeeringError;
pub use events::PeerEvent;
pub use manager::{PeeringManager, PeeringManagerConfig};
pub use peer::{ConnectedPeer, ConnectionOrigin, ConnectionState, PeerKind, StaticPeerEntry};
pub use traits::ConnectionManager;
