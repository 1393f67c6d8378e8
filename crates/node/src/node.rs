//! Node assembly: builds the autopeering and peering components from
//! configuration and runs them.

use std::sync::Arc;

use autopeer_autopeering::{Discovery, Local, Selection};
use autopeer_bridge::{AutopeeringContext, BridgeHandle, ConfiguredBridge, PeerBridge};
use autopeer_peering::PeeringManager;
use eyre::{Result, WrapErr};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::NodeConfig;

type SharedSelection = Arc<Selection>;
type SharedManager = Arc<PeeringManager>;

/// A configured node: every component is built and every subscription is in
/// place, but nothing runs yet.
pub struct Node {
    config: NodeConfig,
    local: Local,
    discovery: Arc<Discovery>,
    selection: SharedSelection,
    manager: Option<SharedManager>,
    bridge: Option<ConfiguredBridge<SharedSelection, SharedManager>>,
}

impl Node {
    pub fn configure(config: NodeConfig) -> Result<Self> {
        config.validate().wrap_err("invalid node configuration")?;

        let plugins = config.plugin_status();
        info!(enabled = ?plugins.enabled, disabled = ?plugins.disabled, "plugin status");

        let local = Local::generate(config.autopeering.gossip_port);
        let discovery = Arc::new(Discovery::new(&local));
        let selection = Arc::new(Selection::new(config.autopeering.selection_parameters()));

        let manager = if config.peering.enabled {
            let manager = PeeringManager::new(config.peering.manager_config())
                .wrap_err("failed to register static peers")?;
            info!(static_peers = manager.static_count(), "peering manager ready");
            Some(Arc::new(manager))
        } else {
            None
        };

        let bridge = config.autopeering.enabled.then(|| {
            let mut ctx = AutopeeringContext::new(
                local.clone(),
                Arc::clone(&discovery),
                Arc::clone(&selection),
            );
            if let Some(manager) = &manager {
                ctx = ctx.with_manager(Arc::clone(manager));
            }
            PeerBridge::configure(&ctx)
        });

        info!(
            id = %local.id(),
            bind_address = %config.autopeering.bind_address,
            gossip_port = config.autopeering.gossip_port,
            "node configured"
        );

        Ok(Self {
            config,
            local,
            discovery,
            selection,
            manager,
            bridge,
        })
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn local(&self) -> &Local {
        &self.local
    }

    /// Start the bridge listeners and the selection loop. Must be called
    /// from within a Tokio runtime.
    pub fn run(self) -> NodeHandle {
        let shutdown = CancellationToken::new();
        let mut tasks = Vec::new();

        let bridge = self.bridge.map(|bridge| bridge.run(shutdown.child_token()));

        if self.config.autopeering.enabled {
            tasks.push(tokio::spawn(
                Arc::clone(&self.selection).run(shutdown.child_token()),
            ));
        }

        info!(id = %self.local.id(), "node running");

        NodeHandle {
            local: self.local,
            discovery: self.discovery,
            selection: self.selection,
            manager: self.manager,
            bridge,
            tasks,
            shutdown,
        }
    }
}

/// Handle to a running node.
pub struct NodeHandle {
    local: Local,
    discovery: Arc<Discovery>,
    selection: SharedSelection,
    manager: Option<SharedManager>,
    bridge: Option<BridgeHandle>,
    tasks: Vec<JoinHandle<()>>,
    shutdown: CancellationToken,
}

impl NodeHandle {
    pub fn local(&self) -> &Local {
        &self.local
    }

    pub fn discovery(&self) -> &Arc<Discovery> {
        &self.discovery
    }

    pub fn selection(&self) -> &SharedSelection {
        &self.selection
    }

    /// `None` when peering is disabled.
    pub fn manager(&self) -> Option<&SharedManager> {
        self.manager.as_ref()
    }

    /// `None` when autopeering is disabled.
    pub fn bridge(&self) -> Option<&BridgeHandle> {
        self.bridge.as_ref()
    }

    pub fn shutdown_signal(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Stop every task and wait for them to exit.
    pub async fn shutdown(self) {
        self.shutdown.cancel();

        if let Some(bridge) = self.bridge {
            bridge.stop().await;
        }
        for task in self.tasks {
            if let Err(err) = task.await {
                warn!(%err, "node task failed");
            }
        }

        debug!("all node tasks stopped");
        info!("node shutdown complete");
    }

    /// Wait until the shutdown signal fires, then stop the node.
    pub async fn wait_for_shutdown(self) {
        self.shutdown.cancelled().await;
        self.shutdown().await;
    }
}
