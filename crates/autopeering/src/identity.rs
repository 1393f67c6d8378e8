//! Peer identities and the local node's own autopeering identity.

use std::fmt;

use crate::service::{GOSSIP_SERVICE_KEY, ServiceMap};

/// Identity key assigned by the discovery protocol.
///
/// Displayed as the hex encoding of its first eight bytes, which is what
/// operators see in logs. `Debug` prints the full key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerId([u8; 32]);

impl PeerId {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn random() -> Self {
        Self(rand::random())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl From<[u8; 32]> for PeerId {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (short, _) = self.0.split_at(8);
        f.write_str(&hex::encode(short))
    }
}

impl fmt::Debug for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PeerId({})", hex::encode(self.0))
    }
}

/// The local node as seen by autopeering: its identity and the services it
/// advertises to discovered peers.
#[derive(Debug, Clone)]
pub struct Local {
    id: PeerId,
    services: ServiceMap,
}

impl Local {
    pub fn new(id: PeerId, services: ServiceMap) -> Self {
        Self { id, services }
    }

    /// Fresh random identity advertising a TCP gossip service on `gossip_port`.
    pub fn generate(gossip_port: u16) -> Self {
        let services = ServiceMap::new().with(GOSSIP_SERVICE_KEY, "tcp", gossip_port);
        Self::new(PeerId::random(), services)
    }

    pub fn id(&self) -> PeerId {
        self.id
    }

    pub fn services(&self) -> &ServiceMap {
        &self.services
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_short_hex() {
        let id = PeerId::new([7; 32]);
        assert_eq!(id.to_string(), "0707070707070707");
        assert!(format!("{id:?}").starts_with("PeerId(0707"));
    }

    #[test]
    fn test_local_advertises_gossip() {
        let local = Local::generate(15600);
        let gossip = local.services().gossip().unwrap();
        assert_eq!(gossip.port(), 15600);
        assert_eq!(gossip.network(), "tcp");
    }

    #[test]
    fn test_random_ids_differ() {
        assert_ne!(PeerId::random(), PeerId::random());
    }
}
