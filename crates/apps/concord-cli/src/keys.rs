//! Key files.
//!
//! The node key is stored as the libp2p protobuf keypair encoding; the
//! publisher key as its raw 32-byte Ed25519 secret. Both are written with
//! owner-only permissions on Unix.

use concord_net::NodeIdentity;
use concord_node::PublisherIdentity;
use std::path::Path;
use tracing::info;

use crate::config::IdentityConfig;
use crate::error::{CliError, CliResult};

/// Both keys of a node.
#[derive(Debug, Clone)]
pub struct NodeKeys {
    pub node: NodeIdentity,
    pub publisher: PublisherIdentity,
}

/// Create both keys. Existing files are kept unless `force` is set.
pub fn create_keys(config: &IdentityConfig, force: bool) -> CliResult<NodeKeys> {
    if !force {
        for path in [&config.node_key, &config.publisher_key] {
            if path.exists() {
                return Err(CliError::IdentityExists(path.clone()));
            }
        }
    }

    let keys = NodeKeys {
        node: NodeIdentity::generate(),
        publisher: PublisherIdentity::generate(),
    };
    write_secret(&config.node_key, &keys.node.to_protobuf_encoding()?)?;
    write_secret(&config.publisher_key, &keys.publisher.secret_bytes())?;

    info!("Created node identity {}", keys.node.peer_id());
    Ok(keys)
}

/// Load both keys; fails if either file is missing.
pub fn load_keys(config: &IdentityConfig) -> CliResult<NodeKeys> {
    if !config.node_key.exists() || !config.publisher_key.exists() {
        return Err(CliError::IdentityNotInitialized);
    }

    let node = NodeIdentity::from_protobuf_encoding(&std::fs::read(&config.node_key)?)?;
    let publisher = PublisherIdentity::from_secret_bytes(&std::fs::read(&config.publisher_key)?)?;

    Ok(NodeKeys { node, publisher })
}

/// Load both keys, generating them on first start.
pub fn load_or_create_keys(config: &IdentityConfig) -> CliResult<NodeKeys> {
    match load_keys(config) {
        Err(CliError::IdentityNotInitialized)
            if !config.node_key.exists() && !config.publisher_key.exists() =>
        {
            create_keys(config, false)
        }
        other => other,
    }
}

fn write_secret(path: &Path, bytes: &[u8]) -> CliResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }

    Ok(())
}
