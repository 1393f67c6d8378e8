//! Recording doubles and log capture for bridge tests.

use std::io;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

use autopeer_autopeering::{
    AutopeeredPeer, EventEmitter, GOSSIP_SERVICE_KEY, NeighborSelection, PeerId, SelectionEvents,
    ServiceMap,
};
use autopeer_peering::{
    ConnectedPeer, ConnectionManager, ConnectionOrigin, OriginAddress, PeerEvent, PeerKind,
    PeeringError, StaticPeerEntry,
};
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing_subscriber::fmt::MakeWriter;

/// Autopeered peer `n` at `ip` with a gossip service on 15600.
pub(crate) fn make_peer(n: u8, ip: [u8; 4]) -> AutopeeredPeer {
    AutopeeredPeer::new(
        PeerId::new([n; 32]),
        IpAddr::V4(Ipv4Addr::from(ip)),
        ServiceMap::new().with(GOSSIP_SERVICE_KEY, "tcp", 15600),
    )
}

pub(crate) fn autopeered_connection(peer: AutopeeredPeer) -> Arc<ConnectedPeer> {
    let address = OriginAddress::new(peer.ip().to_string(), 15600);
    Arc::new(ConnectedPeer::new(
        address,
        ConnectionOrigin::Outbound,
        PeerKind::Autopeered(peer),
        "",
    ))
}

pub(crate) fn static_connection(address: &str, port: u16) -> Arc<ConnectedPeer> {
    let entry = StaticPeerEntry::new(address, port);
    Arc::new(ConnectedPeer::new(
        entry.origin(),
        ConnectionOrigin::Outbound,
        PeerKind::Static(entry),
        "",
    ))
}

pub(crate) fn manual_connection(address: &str, port: u16) -> Arc<ConnectedPeer> {
    Arc::new(ConnectedPeer::new(
        OriginAddress::new(address, port),
        ConnectionOrigin::Outbound,
        PeerKind::Manual,
        "",
    ))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ManagerCall {
    Add {
        address: String,
        is_static: bool,
        comment: String,
        autopeering: Option<AutopeeredPeer>,
    },
    Remove {
        identity: String,
    },
    Whitelist {
        addresses: Vec<String>,
        port: u16,
        autopeering: Option<AutopeeredPeer>,
    },
}

/// Connection manager double that records every mutation.
#[derive(Default)]
pub(crate) struct RecordingManager {
    calls: Mutex<Vec<ManagerCall>>,
    statically_peered: Mutex<bool>,
    add_error: Mutex<Option<PeeringError>>,
    remove_error: Mutex<Option<PeeringError>>,
    connected: Mutex<Vec<Arc<ConnectedPeer>>>,
    events: EventEmitter<PeerEvent>,
}

impl RecordingManager {
    pub(crate) fn calls(&self) -> Vec<ManagerCall> {
        self.calls.lock().clone()
    }

    pub(crate) fn set_statically_peered(&self, value: bool) {
        *self.statically_peered.lock() = value;
    }

    pub(crate) fn fail_add(&self, err: PeeringError) {
        *self.add_error.lock() = Some(err);
    }

    pub(crate) fn fail_remove(&self, err: PeeringError) {
        *self.remove_error.lock() = Some(err);
    }

    pub(crate) fn set_connected(&self, peers: Vec<Arc<ConnectedPeer>>) {
        *self.connected.lock() = peers;
    }

    pub(crate) fn emit(&self, event: PeerEvent) {
        self.events.emit(event);
    }
}

impl ConnectionManager for RecordingManager {
    fn add(
        &self,
        address: &str,
        is_static: bool,
        comment: &str,
        autopeering: Option<AutopeeredPeer>,
    ) -> Result<(), PeeringError> {
        self.calls.lock().push(ManagerCall::Add {
            address: address.to_string(),
            is_static,
            comment: comment.to_string(),
            autopeering,
        });
        self.add_error.lock().clone().map_or(Ok(()), Err)
    }

    fn remove(&self, identity: &str) -> Result<(), PeeringError> {
        self.calls.lock().push(ManagerCall::Remove {
            identity: identity.to_string(),
        });
        self.remove_error.lock().clone().map_or(Ok(()), Err)
    }

    fn whitelist(&self, addresses: &[String], port: u16, autopeering: Option<AutopeeredPeer>) {
        self.calls.lock().push(ManagerCall::Whitelist {
            addresses: addresses.to_vec(),
            port,
            autopeering,
        });
    }

    fn is_statically_peered(&self, _addresses: &[String], _port: u16) -> bool {
        *self.statically_peered.lock()
    }

    fn for_all_connected(&self, f: &mut dyn FnMut(&Arc<ConnectedPeer>) -> bool) {
        let connected = self.connected.lock().clone();
        for peer in &connected {
            if f(peer) {
                break;
            }
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<PeerEvent> {
        self.events.subscribe()
    }
}

/// Selection double that records `remove_neighbor` calls.
#[derive(Default)]
pub(crate) struct RecordingSelection {
    events: SelectionEvents,
    removed: Mutex<Vec<PeerId>>,
}

impl RecordingSelection {
    pub(crate) fn removed(&self) -> Vec<PeerId> {
        self.removed.lock().clone()
    }
}

impl NeighborSelection for RecordingSelection {
    fn events(&self) -> &SelectionEvents {
        &self.events
    }

    fn remove_neighbor(&self, id: &PeerId) {
        self.removed.lock().push(*id);
    }
}

#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run `f` with a thread-local subscriber and return everything it logged.
pub(crate) fn capture_logs(f: impl FnOnce()) -> String {
    let buffer = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(buffer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::TRACE)
        .finish();

    tracing::subscriber::with_default(subscriber, f);

    let bytes = buffer.0.lock().clone();
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Poll `condition` until it holds or five seconds pass.
pub(crate) async fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
