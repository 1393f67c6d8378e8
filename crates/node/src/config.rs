//! Node configuration (TOML-serializable).

use std::fs;
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};

use autopeer_autopeering::{MAX_SALT_LIFETIME, SelectionParameters};
use autopeer_peering::{PeeringManagerConfig, StaticPeerEntry};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_INBOUND_PEERS: usize = 4;
pub const DEFAULT_OUTBOUND_PEERS: usize = 4;
pub const DEFAULT_SALT_LIFETIME_MINUTES: u64 = 30;
pub const DEFAULT_GOSSIP_PORT: u16 = 15600;
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 256;
pub const DEFAULT_LOG_LEVEL: &str = "info";

pub const AUTOPEERING_PLUGIN: &str = "Autopeering";
pub const PEERING_PLUGIN: &str = "Peering";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Complete node configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    #[serde(default)]
    pub autopeering: AutopeeringConfig,

    #[serde(default)]
    pub peering: PeeringConfig,

    #[serde(default)]
    pub log: LogConfig,
}

impl NodeConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let input = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&input)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let max_minutes = MAX_SALT_LIFETIME.as_secs() / 60;
        if self.autopeering.salt_lifetime_minutes == 0 {
            return Err(ConfigError::Invalid(
                "autopeering.salt_lifetime_minutes must be at least 1".into(),
            ));
        }
        if self.autopeering.salt_lifetime_minutes > max_minutes {
            return Err(ConfigError::Invalid(format!(
                "autopeering.salt_lifetime_minutes must be at most {max_minutes}"
            )));
        }
        if self.peering.event_channel_capacity == 0 {
            return Err(ConfigError::Invalid(
                "peering.event_channel_capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Enabled and disabled plugins, each sorted by name.
    pub fn plugin_status(&self) -> PluginStatus {
        let mut status = PluginStatus::default();
        for (name, enabled) in [
            (AUTOPEERING_PLUGIN, self.autopeering.enabled),
            (PEERING_PLUGIN, self.peering.enabled),
        ] {
            if enabled {
                status.enabled.push(name);
            } else {
                status.disabled.push(name);
            }
        }
        status.enabled.sort_unstable();
        status.disabled.sort_unstable();
        status
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginStatus {
    pub enabled: Vec<&'static str>,
    pub disabled: Vec<&'static str>,
}

/// Autopeering plugin configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutopeeringConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Number of accepted inbound neighbors
    #[serde(default = "default_inbound_peers")]
    pub inbound_peers: usize,

    /// Number of chosen outbound neighbors
    #[serde(default = "default_outbound_peers")]
    pub outbound_peers: usize,

    #[serde(default = "default_salt_lifetime_minutes")]
    pub salt_lifetime_minutes: u64,

    /// Port advertised in the local `gossip` service record
    #[serde(default = "default_gossip_port")]
    pub gossip_port: u16,

    #[serde(default = "default_bind_address")]
    pub bind_address: IpAddr,
}

impl Default for AutopeeringConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            inbound_peers: default_inbound_peers(),
            outbound_peers: default_outbound_peers(),
            salt_lifetime_minutes: default_salt_lifetime_minutes(),
            gossip_port: default_gossip_port(),
            bind_address: default_bind_address(),
        }
    }
}

impl AutopeeringConfig {
    pub fn selection_parameters(&self) -> SelectionParameters {
        SelectionParameters::new(
            self.inbound_peers,
            self.outbound_peers,
            self.salt_lifetime_minutes,
        )
    }
}

/// Peering plugin configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeeringConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default)]
    pub static_peers: Vec<StaticPeerEntry>,

    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl Default for PeeringConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            static_peers: Vec::new(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

impl PeeringConfig {
    pub fn manager_config(&self) -> PeeringManagerConfig {
        PeeringManagerConfig {
            static_peers: self.static_peers.clone(),
            event_channel_capacity: self.event_channel_capacity,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Base level used when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Extra comma-separated filter directives, e.g. `autopeer_bridge=debug`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            filter: None,
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_inbound_peers() -> usize {
    DEFAULT_INBOUND_PEERS
}

fn default_outbound_peers() -> usize {
    DEFAULT_OUTBOUND_PEERS
}

fn default_salt_lifetime_minutes() -> u64 {
    DEFAULT_SALT_LIFETIME_MINUTES
}

fn default_gossip_port() -> u16 {
    DEFAULT_GOSSIP_PORT
}

fn default_bind_address() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_event_channel_capacity() -> usize {
    DEFAULT_EVENT_CHANNEL_CAPACITY
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = NodeConfig::from_toml_str("").unwrap();
        assert_eq!(config, NodeConfig::default());
        assert!(config.autopeering.enabled);
        assert_eq!(config.autopeering.inbound_peers, 4);
        assert_eq!(config.autopeering.outbound_peers, 4);
        assert_eq!(config.autopeering.gossip_port, 15600);
        assert_eq!(config.peering.event_channel_capacity, 256);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_parse_full_config() {
        let config = NodeConfig::from_toml_str(
            r#"
            [autopeering]
            inbound_peers = 2
            outbound_peers = 3
            salt_lifetime_minutes = 10
            bind_address = "127.0.0.1"

            [peering]
            enabled = false

            [[peering.static_peers]]
            address = "10.0.0.1"
            port = 15600
            alias = "alpha"

            [log]
            level = "debug"
            filter = "autopeer_bridge=trace"
            "#,
        )
        .unwrap();

        assert_eq!(config.autopeering.bind_address, IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert!(!config.peering.enabled);
        assert_eq!(
            config.peering.static_peers,
            vec![StaticPeerEntry::new("10.0.0.1", 15600).with_alias("alpha")]
        );
        assert_eq!(config.log.filter.as_deref(), Some("autopeer_bridge=trace"));

        let params = config.autopeering.selection_parameters();
        assert_eq!(params.inbound_neighbor_size, 2);
        assert_eq!(params.outbound_neighbor_size, 3);
        assert_eq!(params.salt_lifetime, Duration::from_secs(600));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err =
            NodeConfig::from_toml_str("[autopeering]\nsalt_lifetime_minutes = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = NodeConfig::from_toml_str("[autopeering]\ninbound_peers = \"four\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_salt_lifetime_upper_bound() {
        let err = NodeConfig::from_toml_str(
            "[autopeering]\nsalt_lifetime_minutes = 4611686018427387904",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("at most 525600")));

        let config =
            NodeConfig::from_toml_str("[autopeering]\nsalt_lifetime_minutes = 525600").unwrap();
        assert_eq!(config.autopeering.selection_parameters().salt_lifetime, MAX_SALT_LIFETIME);
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = NodeConfig::default();
        config.peering.static_peers.push(StaticPeerEntry::new("10.0.0.2", 15601));

        let encoded = toml::to_string(&config).unwrap();
        assert_eq!(NodeConfig::from_toml_str(&encoded).unwrap(), config);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[autopeering]\ngossip_port = 16000").unwrap();

        let config = NodeConfig::load(file.path()).unwrap();
        assert_eq!(config.autopeering.gossip_port, 16000);

        let missing = file.path().with_extension("missing");
        assert!(matches!(NodeConfig::load(&missing), Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_plugin_status_sorted() {
        let mut config = NodeConfig::default();
        assert_eq!(config.plugin_status().enabled, vec!["Autopeering", "Peering"]);
        assert!(config.plugin_status().disabled.is_empty());

        config.autopeering.enabled = false;
        let status = config.plugin_status();
        assert_eq!(status.enabled, vec!["Peering"]);
        assert_eq!(status.disabled, vec!["Autopeering"]);
    }
}
