//! Autopeer node: configuration, logging and lifecycle.
//!
//! [`Node::configure`] builds discovery, selection and (if enabled) the
//! peering manager, and subscribes the bridge. [`Node::run`] starts the
//! background tasks and returns a [`NodeHandle`].

#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

pub mod config;
pub mod logging;
mod node;

pub use config::{
    AutopeeringConfig, ConfigError, LogConfig, NodeConfig, PeeringConfig, PluginStatus,
};
pub use logging::init_logging;
pub use node::{Node, NodeHandle};
