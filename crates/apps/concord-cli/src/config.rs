//! CLI configuration.
//!
//! ```toml
//! [identity]
//! node_key = "/home/me/.local/share/concord/identity/node.key"
//! publisher_key = "/home/me/.local/share/concord/identity/publisher.key"
//!
//! [network]
//! listen_address = "/ip4/0.0.0.0/tcp/9001"
//! directory = "/ip4/203.0.113.7/tcp/9000/p2p/QmDirectory..."
//! nat = "none"
//! idle_timeout_secs = 60
//!
//! [control]
//! bind = "127.0.0.1:9002"
//!
//! [registration]
//! interval_secs = 300
//! retry_secs = 300
//! ```

use concord_net::{Multiaddr, NetworkConfig, PeerAddressInfo};
use concord_node::{NatConfig, NodeConfig};
use concord_types::constants::{
    DEFAULT_CONTROL_ADDRESS, DEFAULT_LISTEN_ADDRESS, IDLE_CONNECTION_TIMEOUT, REGISTER_INTERVAL,
    REGISTER_RETRY_INTERVAL,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{CliError, CliResult};

/// CLI configuration loaded from TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Identity configuration.
    pub identity: IdentityConfig,
    /// Network configuration.
    pub network: NetworkSection,
    /// Control surface configuration.
    pub control: ControlConfig,
    /// Directory registration timing.
    pub registration: RegistrationConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        let base_dir = default_base_dir();
        Self {
            identity: IdentityConfig::new(&base_dir),
            network: NetworkSection::default(),
            control: ControlConfig::default(),
            registration: RegistrationConfig::default(),
        }
    }
}

impl CliConfig {
    /// Load configuration from a file. A missing file yields the defaults.
    pub fn load(path: &Path) -> CliResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> CliResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)
            .map_err(|e| CliError::config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn listen_address(&self) -> CliResult<Multiaddr> {
        self.network.listen_address.parse().map_err(|e| {
            CliError::config(format!(
                "invalid listen address {:?}: {}",
                self.network.listen_address, e
            ))
        })
    }

    /// The configured NAT setting, parsed.
    pub fn nat(&self) -> CliResult<NatConfig> {
        self.network
            .nat
            .parse::<NatConfig>()
            .map_err(|e| CliError::config(e.to_string()))
    }

    /// The configured directory handle, parsed.
    pub fn directory(&self) -> CliResult<Option<PeerAddressInfo>> {
        self.network
            .directory
            .as_deref()
            .map(|handle| {
                PeerAddressInfo::parse_handle(handle)
                    .map_err(|e| CliError::config(format!("invalid directory handle: {}", e)))
            })
            .transpose()
    }

    /// Lifecycle configuration for the node.
    pub fn node_config(&self) -> CliResult<NodeConfig> {
        let mut config = NodeConfig::new()
            .with_listen_address(self.listen_address()?)
            .with_register_interval(Duration::from_secs(self.registration.interval_secs))
            .with_retry_interval(Duration::from_secs(self.registration.retry_secs))
            .with_nat(self.nat()?);
        if let Some(directory) = self.directory()? {
            config = config.with_directory(directory);
        }
        Ok(config)
    }

    /// Host configuration for the libp2p transport.
    pub fn network_config(&self) -> NetworkConfig {
        NetworkConfig::new()
            .with_idle_connection_timeout(Duration::from_secs(self.network.idle_timeout_secs))
    }
}

/// Key file locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// libp2p keypair, protobuf-encoded.
    pub node_key: PathBuf,
    /// Ed25519 publisher secret, 32 raw bytes.
    pub publisher_key: PathBuf,
}

impl IdentityConfig {
    fn new(base_dir: &Path) -> Self {
        let identity_dir = base_dir.join("identity");
        Self {
            node_key: identity_dir.join("node.key"),
            publisher_key: identity_dir.join("publisher.key"),
        }
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self::new(&default_base_dir())
    }
}

/// Network configuration section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkSection {
    /// Multiaddr the host listens on.
    pub listen_address: String,
    /// Directory handle, `<multiaddr>/p2p/<peer-id>`.
    pub directory: Option<String>,
    /// Advertised addresses: `none`, `*` or a multiaddr.
    pub nat: String,
    /// Idle connection timeout in seconds.
    pub idle_timeout_secs: u64,
}

impl Default for NetworkSection {
    fn default() -> Self {
        Self {
            listen_address: DEFAULT_LISTEN_ADDRESS.to_string(),
            directory: None,
            nat: NatConfig::None.to_string(),
            idle_timeout_secs: IDLE_CONNECTION_TIMEOUT.as_secs(),
        }
    }
}

/// Control surface configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Address the HTTP control surface binds to.
    pub bind: String,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_CONTROL_ADDRESS.to_string(),
        }
    }
}

impl ControlConfig {
    pub fn bind_address(&self) -> CliResult<SocketAddr> {
        self.bind
            .parse()
            .map_err(|e| CliError::config(format!("invalid control address {:?}: {}", self.bind, e)))
    }
}

/// Directory registration timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationConfig {
    /// Seconds between heartbeats.
    pub interval_secs: u64,
    /// Seconds to wait before retrying a failed registration.
    pub retry_secs: u64,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            interval_secs: REGISTER_INTERVAL.as_secs(),
            retry_secs: REGISTER_RETRY_INTERVAL.as_secs(),
        }
    }
}

/// Base directory for Concord data. `CONCORD_DATA_DIR` overrides it.
pub fn default_base_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("CONCORD_DATA_DIR") {
        return PathBuf::from(dir);
    }

    directories::ProjectDirs::from("net", "concord", "concord")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| {
            std::env::var("HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(".concord")
        })
}

/// Get the default config file path.
pub fn default_config_path() -> PathBuf {
    default_base_dir().join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = CliConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, CliConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = CliConfig::default();
        config.network.listen_address = "/ip4/127.0.0.1/tcp/4001".to_string();
        config.registration.interval_secs = 60;
        config.save(&path).unwrap();

        let loaded = CliConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[control]\nbind = \"127.0.0.1:7000\"\n").unwrap();

        let config = CliConfig::load(&path).unwrap();
        assert_eq!(config.control.bind, "127.0.0.1:7000");
        assert_eq!(config.network.listen_address, DEFAULT_LISTEN_ADDRESS);
        assert_eq!(config.registration.retry_secs, 300);
    }

    #[test]
    fn test_node_config_conversion() {
        let mut config = CliConfig::default();
        config.registration.interval_secs = 10;
        config.registration.retry_secs = 20;

        let node_config = config.node_config().unwrap();
        assert_eq!(node_config.listen_address.to_string(), DEFAULT_LISTEN_ADDRESS);
        assert_eq!(node_config.register_interval, Duration::from_secs(10));
        assert_eq!(node_config.retry_interval, Duration::from_secs(20));
        assert!(node_config.directory.is_none());
        assert_eq!(node_config.nat, NatConfig::None);
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        let mut config = CliConfig::default();
        config.network.listen_address = "not a multiaddr".to_string();
        assert!(matches!(config.listen_address(), Err(CliError::Config(_))));

        config.network.directory = Some("nil".to_string());
        assert!(matches!(config.directory(), Err(CliError::Config(_))));

        config.network.nat = "upnp".to_string();
        assert!(matches!(config.nat(), Err(CliError::Config(_))));

        config.control.bind = "localhost".to_string();
        assert!(matches!(config.control.bind_address(), Err(CliError::Config(_))));
    }

    #[test]
    fn test_default_control_address_parses() {
        let addr = ControlConfig::default().bind_address().unwrap();
        assert!(addr.ip().is_loopback());
    }
}
