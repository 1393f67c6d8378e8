//! Gossip endpoint resolution from advertised service records.

use std::fmt;
use std::net::{IpAddr, SocketAddr};

use autopeer_autopeering::{AutopeeredPeer, GOSSIP_SERVICE_KEY, PeerId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EndpointError {
    #[error("peer {id} advertises no {service} service")]
    MissingService { id: PeerId, service: &'static str },
}

/// Where a peer accepts gossip connections: its IP combined with the port of
/// its `gossip` service record.
///
/// Displays as canonical `host:port` (IPv6 hosts bracketed). Every
/// connection manager call uses this form so identity comparisons agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GossipEndpoint {
    ip: IpAddr,
    port: u16,
}

impl GossipEndpoint {
    pub fn resolve(peer: &AutopeeredPeer) -> Result<Self, EndpointError> {
        let service = peer
            .gossip_service()
            .ok_or(EndpointError::MissingService {
                id: *peer.id(),
                service: GOSSIP_SERVICE_KEY,
            })?;

        Ok(Self {
            ip: peer.ip(),
            port: service.port(),
        })
    }

    pub fn ip(&self) -> IpAddr {
        self.ip
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Host part as the connection manager expects it in address lists.
    pub fn host(&self) -> String {
        self.ip.to_string()
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.port)
    }
}

impl fmt::Display for GossipEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.socket_addr().fmt(f)
    }
}
