//! Configure-then-run wiring of the bridge onto the event channels.

use std::sync::Arc;

use autopeer_autopeering::{
    DeletedEvent, DiscoveredEvent, DroppedEvent, NeighborSelection, PeeringEvent, SaltUpdatedEvent,
};
use autopeer_peering::{ConnectionManager, PeerEvent};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::bridge::{PeerBridge, on_peer_deleted, on_peer_discovered, on_salt_updated};
use crate::context::AutopeeringContext;

impl<S, M> PeerBridge<S, M>
where
    S: NeighborSelection + Clone,
    M: ConnectionManager + Clone,
{
    /// Subscribe to every channel the bridge listens on.
    ///
    /// Events published before this call are not observed. Without a
    /// connection manager only the logging handlers are subscribed.
    pub fn configure(ctx: &AutopeeringContext<S, M>) -> ConfiguredBridge<S, M> {
        let discovery = ctx.discovery().events();
        let selection = ctx.selection().events();

        let bridging = ctx.manager().map(|manager| BridgingStreams {
            outgoing: selection.outgoing_peering.subscribe(),
            incoming: selection.incoming_peering.subscribe(),
            dropped: selection.dropped.subscribe(),
            peer_events: manager.subscribe(),
            bridge: Arc::new(PeerBridge::new(ctx.selection().clone(), manager.clone())),
        });

        let id = ctx.local().id();
        if bridging.is_none() {
            info!(%id, "peering disabled, autopeering events are only logged");
        } else {
            debug!(%id, "bridging autopeering events to the connection manager");
        }

        ConfiguredBridge {
            discovered: discovery.peer_discovered.subscribe(),
            deleted: discovery.peer_deleted.subscribe(),
            salt_updated: selection.salt_updated.subscribe(),
            bridging,
        }
    }
}

struct BridgingStreams<S, M> {
    bridge: Arc<PeerBridge<S, M>>,
    outgoing: broadcast::Receiver<PeeringEvent>,
    incoming: broadcast::Receiver<PeeringEvent>,
    dropped: broadcast::Receiver<DroppedEvent>,
    peer_events: broadcast::Receiver<PeerEvent>,
}

/// A bridge with all subscriptions in place, ready to run.
pub struct ConfiguredBridge<S, M> {
    discovered: broadcast::Receiver<DiscoveredEvent>,
    deleted: broadcast::Receiver<DeletedEvent>,
    salt_updated: broadcast::Receiver<SaltUpdatedEvent>,
    bridging: Option<BridgingStreams<S, M>>,
}

impl<S, M> ConfiguredBridge<S, M>
where
    S: NeighborSelection,
    M: ConnectionManager,
{
    /// Log-only mode: no connection manager was configured.
    pub fn is_degraded(&self) -> bool {
        self.bridging.is_none()
    }

    /// Spawn one listener task per event stream.
    pub fn run(self, shutdown: CancellationToken) -> BridgeHandle {
        let mut tasks = vec![
            spawn_listener("peer_discovered", self.discovered, shutdown.clone(), |event| {
                on_peer_discovered(&event)
            }),
            spawn_listener("peer_deleted", self.deleted, shutdown.clone(), |event| {
                on_peer_deleted(&event)
            }),
            spawn_listener("salt_updated", self.salt_updated, shutdown.clone(), |event| {
                on_salt_updated(&event)
            }),
        ];

        if let Some(streams) = self.bridging {
            let bridge = Arc::clone(&streams.bridge);
            tasks.push(spawn_listener(
                "outgoing_peering",
                streams.outgoing,
                shutdown.clone(),
                move |event| bridge.on_outgoing_peering(&event),
            ));

            let bridge = Arc::clone(&streams.bridge);
            tasks.push(spawn_listener(
                "incoming_peering",
                streams.incoming,
                shutdown.clone(),
                move |event| bridge.on_incoming_peering(&event),
            ));

            let bridge = Arc::clone(&streams.bridge);
            tasks.push(spawn_listener(
                "dropped",
                streams.dropped,
                shutdown.clone(),
                move |event| bridge.on_dropped(&event),
            ));

            let bridge = streams.bridge;
            tasks.push(spawn_listener(
                "peer_disconnected",
                streams.peer_events,
                shutdown.clone(),
                move |event| {
                    if let PeerEvent::Disconnected { peer } = event {
                        bridge.on_peer_disconnected(&peer);
                    }
                },
            ));
        }

        debug!(tasks = tasks.len(), "peer bridge running");
        BridgeHandle { shutdown, tasks }
    }
}

fn spawn_listener<E, F>(
    stream: &'static str,
    mut rx: broadcast::Receiver<E>,
    shutdown: CancellationToken,
    mut handler: F,
) -> JoinHandle<()>
where
    E: Clone + Send + 'static,
    F: FnMut(E) + Send + 'static,
{
    tokio::spawn(async move {
        trace!(stream, "bridge listener started");

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    debug!(stream, "bridge listener received shutdown signal");
                    break;
                }

                result = rx.recv() => {
                    match result {
                        Ok(event) => handler(event),
                        Err(RecvError::Closed) => {
                            debug!(stream, "event channel closed");
                            break;
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(stream, skipped, "bridge listener lagged, events were dropped");
                        }
                    }
                }
            }
        }
    })
}

/// Handle to the running bridge listeners.
pub struct BridgeHandle {
    shutdown: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl BridgeHandle {
    pub fn shutdown_signal(&self) -> &CancellationToken {
        &self.shutdown
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_finished(&self) -> bool {
        self.tasks.iter().all(JoinHandle::is_finished)
    }

    /// Cancel the listeners and wait for them to exit. Pending events are
    /// not drained.
    pub async fn stop(self) {
        self.shutdown.cancel();
        for task in self.tasks {
            if let Err(err) = task.await {
                warn!(%err, "bridge listener task failed");
            }
        }
        debug!("peer bridge stopped");
    }
}
