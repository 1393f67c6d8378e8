//! Bridge between autopeering and the peering connection manager.
//!
//! Selection outcomes become connection manager calls (`add`, `whitelist`,
//! `remove`); manager disconnects become `remove_neighbor` calls on
//! selection; selection drops are resolved back to a registered connection
//! and removed. Discovery and salt events are only logged.
//!
//! # Lifecycle
//!
//! 1. Build an [`AutopeeringContext`] once at startup.
//! 2. [`PeerBridge::configure`] subscribes to every channel it needs. Events
//!    published before this point are never seen.
//! 3. [`ConfiguredBridge::run`] spawns one listener task per event stream and
//!    returns a [`BridgeHandle`].
//! 4. [`BridgeHandle::stop`] cancels the listeners. In-flight events are not
//!    drained.
//!
//! Without a connection manager the bridge runs in log-only mode.

#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod bridge;
mod context;
mod endpoint;
mod worker;

#[cfg(test)]
mod test_utils;

pub use bridge::{PeerBridge, on_peer_deleted, on_peer_discovered, on_salt_updated};
pub use context::AutopeeringContext;
pub use endpoint::{EndpointError, GossipEndpoint};
pub use worker::{BridgeHandle, ConfiguredBridge};
