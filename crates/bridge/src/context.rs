//! References the bridge needs, gathered once at startup.

use std::sync::Arc;

use autopeer_autopeering::{Discovery, Local};

/// Autopeering components plus the optional connection manager.
///
/// `manager` is `None` when the peering plugin is disabled.
pub struct AutopeeringContext<S, M> {
    local: Local,
    discovery: Arc<Discovery>,
    selection: S,
    manager: Option<M>,
}

impl<S, M> AutopeeringContext<S, M> {
    pub fn new(local: Local, discovery: Arc<Discovery>, selection: S) -> Self {
        Self {
            local,
            discovery,
            selection,
            manager: None,
        }
    }

    pub fn with_manager(mut self, manager: M) -> Self {
        self.manager = Some(manager);
        self
    }

    pub fn local(&self) -> &Local {
        &self.local
    }

    pub fn discovery(&self) -> &Arc<Discovery> {
        &self.discovery
    }

    pub fn selection(&self) -> &S {
        &self.selection
    }

    pub fn manager(&self) -> Option<&M> {
        self.manager.as_ref()
    }
}
