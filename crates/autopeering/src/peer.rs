//! Peers found by autopeering discovery.

use std::net::IpAddr;

use crate::identity::PeerId;
use crate::service::{ServiceMap, ServiceRecord};

/// A peer known to discovery/selection. Ephemeral: it exists from discovery
/// until deletion or drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutopeeredPeer {
    id: PeerId,
    ip: IpAddr,
    services: ServiceMap,
}

impl AutopeeredPeer {
    pub fn new(id: PeerId, ip: IpAddr, services: ServiceMap) -> Self {
        Self { id, ip, services }
    }

    pub fn id(&self) -> &PeerId {
        &self.id
    }

    pub fn ip(&self) -> IpAddr {
        self.ip
    }

    pub fn services(&self) -> &ServiceMap {
        &self.services
    }

    pub fn gossip_service(&self) -> Option<&ServiceRecord> {
        self.services.gossip()
    }
}
