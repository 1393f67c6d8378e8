//! Named network services advertised by discovered peers.

use std::collections::BTreeMap;

/// Service key under which peers advertise their gossip endpoint.
pub const GOSSIP_SERVICE_KEY: &str = "gossip";

/// A single advertised service: transport network and port.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceRecord {
    network: String,
    port: u16,
}

impl ServiceRecord {
    pub fn new(network: impl Into<String>, port: u16) -> Self {
        Self {
            network: network.into(),
            port,
        }
    }

    pub fn network(&self) -> &str {
        &self.network
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

/// Services advertised by a peer, keyed by service name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceMap(BTreeMap<String, ServiceRecord>);

impl ServiceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, network: impl Into<String>, port: u16) -> Self {
        self.insert(name, ServiceRecord::new(network, port));
        self
    }

    pub fn insert(
        &mut self,
        name: impl Into<String>,
        record: ServiceRecord,
    ) -> Option<ServiceRecord> {
        self.0.insert(name.into(), record)
    }

    pub fn get(&self, name: &str) -> Option<&ServiceRecord> {
        self.0.get(name)
    }

    pub fn gossip(&self) -> Option<&ServiceRecord> {
        self.get(GOSSIP_SERVICE_KEY)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
