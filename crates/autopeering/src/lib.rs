//! Autopeering primitives: peer identities, advertised services and the
//! event channels published by peer discovery and neighbor selection.
//!
//! The discovery and selection algorithms themselves live outside this
//! workspace. [`Discovery`] and [`Selection`] are in-process registries that
//! carry the same event surface, so the rest of the node can be wired and
//! exercised against them.

#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

pub mod discovery;
pub mod events;
pub mod identity;
pub mod peer;
pub mod salt;
pub mod selection;
pub mod service;

pub use discovery::Discovery;
pub use events::{
    DeletedEvent, DiscoveredEvent, DiscoveryEvents, DroppedEvent, EventEmitter, PeeringEvent,
    SaltUpdatedEvent, SelectionEvents,
};
pub use identity::{Local, PeerId};
pub use peer::AutopeeredPeer;
pub use salt::{MAX_SALT_LIFETIME, Salt};
pub use selection::{
    FULL_OUTBOUND_UPDATE_INTERVAL, NeighborSelection, OUTBOUND_UPDATE_INTERVAL, Selection,
    SelectionParameters,
};
pub use service::{GOSSIP_SERVICE_KEY, ServiceMap, ServiceRecord};
