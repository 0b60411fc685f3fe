//! Show identity command.

use crate::config::CliConfig;
use crate::error::CliResult;
use crate::keys::load_keys;

/// Execute the id command.
pub fn id(config: &CliConfig) -> CliResult<String> {
    let keys = load_keys(&config.identity)?;

    Ok(format!(
        "Peer ID:   {}\nPublisher: {}",
        keys.node.peer_id(),
        keys.publisher.id()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CliError;
    use crate::keys::create_keys;
    use tempfile::TempDir;

    fn test_config(temp_dir: &TempDir) -> CliConfig {
        let mut config = CliConfig::default();
        config.identity.node_key = temp_dir.path().join("node.key");
        config.identity.publisher_key = temp_dir.path().join("publisher.key");
        config
    }

    #[test]
    fn test_id_shows_both_identities() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);
        let keys = create_keys(&config.identity, false).unwrap();

        let output = id(&config).unwrap();
        assert!(output.contains(&keys.node.peer_id().to_string()));
        assert!(output.contains(keys.publisher.id()));
    }

    #[test]
    fn test_id_without_identity() {
        let temp_dir = TempDir::new().unwrap();
        let err = id(&test_config(&temp_dir)).unwrap_err();
        assert!(matches!(err, CliError::IdentityNotInitialized));
    }
}
