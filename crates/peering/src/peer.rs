//! Connected peers and configured static entries.

use std::sync::atomic::{AtomicU8, Ordering};

use autopeer_autopeering::AutopeeredPeer;
use serde::{Deserialize, Serialize};

use crate::address::OriginAddress;

/// A manually configured peer. Immutable for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StaticPeerEntry {
    pub address: String,
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl StaticPeerEntry {
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
            alias: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn origin(&self) -> OriginAddress {
        OriginAddress::new(self.address.as_str(), self.port)
    }

    /// Canonical `host:port` identity.
    pub fn identity(&self) -> String {
        self.origin().to_string()
    }
}

/// Which side opened the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionOrigin {
    Inbound,
    Outbound,
}

/// Transport state of a registered peer (stored as u8 for atomic operations).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    Connecting = 0,
    Connected = 1,
    Disconnected = 2,
}

impl ConnectionState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Connected,
            2 => Self::Disconnected,
            _ => Self::Connecting,
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

/// How a peer came to be registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerKind {
    /// Configured at startup.
    Static(StaticPeerEntry),
    /// Handed over by autopeering; carries the discovery identity.
    Autopeered(AutopeeredPeer),
    /// Added at runtime without an autopeering reference.
    Manual,
}

/// A peer registered with the connection manager.
#[derive(Debug)]
pub struct ConnectedPeer {
    identity: String,
    origin: ConnectionOrigin,
    kind: PeerKind,
    comment: String,
    state: AtomicU8,
}

impl ConnectedPeer {
    pub fn new(
        address: OriginAddress,
        origin: ConnectionOrigin,
        kind: PeerKind,
        comment: impl Into<String>,
    ) -> Self {
        Self {
            identity: address.to_string(),
            origin,
            kind,
            comment: comment.into(),
            state: AtomicU8::new(ConnectionState::Connecting as u8),
        }
    }

    /// Canonical `host:port` identity used for every manager operation.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn origin(&self) -> ConnectionOrigin {
        self.origin
    }

    pub fn kind(&self) -> &PeerKind {
        &self.kind
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn autopeering(&self) -> Option<&AutopeeredPeer> {
        match &self.kind {
            PeerKind::Autopeered(peer) => Some(peer),
            _ => None,
        }
    }

    pub fn is_static(&self) -> bool {
        matches!(self.kind, PeerKind::Static(_))
    }

    pub fn connection_state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub(crate) fn set_connection_state(&self, state: ConnectionState) {
        self.state.store(state as u8, Ordering::Release);
    }
}
