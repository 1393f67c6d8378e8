//! Query/mutation surface of the connection manager.

use std::sync::Arc;

use auto_impl::auto_impl;
use autopeer_autopeering::{AutopeeredPeer, PeerId};
use tokio::sync::broadcast;

use crate::error::PeeringError;
use crate::events::PeerEvent;
use crate::peer::ConnectedPeer;

/// Operations the rest of the node may perform on the connection manager.
///
/// Implementations are internally synchronized; callers hold no locks.
#[auto_impl(&, Arc)]
pub trait ConnectionManager: Send + Sync + 'static {
    /// Register a peer at `address` (`host:port`) and start dialing it.
    /// The dial is not awaited.
    fn add(
        &self,
        address: &str,
        is_static: bool,
        comment: &str,
        autopeering: Option<AutopeeredPeer>,
    ) -> Result<(), PeeringError>;

    /// Unregister the peer with the given `host:port` identity. Static peers
    /// are immutable and cannot be removed.
    fn remove(&self, identity: &str) -> Result<(), PeeringError>;

    /// Pre-authorize an inbound connection from any of `addresses` on `port`.
    fn whitelist(&self, addresses: &[String], port: u16, autopeering: Option<AutopeeredPeer>);

    fn is_statically_peered(&self, addresses: &[String], port: u16) -> bool;

    /// Visit registered peers in unspecified order until `f` returns true.
    fn for_all_connected(&self, f: &mut dyn FnMut(&Arc<ConnectedPeer>) -> bool);

    fn subscribe(&self) -> broadcast::Receiver<PeerEvent>;

    /// Registered peer carrying autopeering identity `id`, if any.
    fn find_autopeered(&self, id: &PeerId) -> Option<Arc<ConnectedPeer>> {
        let mut found = None;
        self.for_all_connected(&mut |peer| {
            if peer.autopeering().is_some_and(|ap| ap.id() == id) {
                found = Some(Arc::clone(peer));
                return true;
            }
            false
        });
        found
    }
}
