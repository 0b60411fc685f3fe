//! Initialize identity command.

use colored::Colorize;
use std::path::Path;

use crate::config::CliConfig;
use crate::error::CliResult;
use crate::keys::create_keys;

/// Execute the init command.
///
/// Writes both key files and, if no configuration file exists yet, the
/// default configuration.
pub fn init(config: &CliConfig, config_path: &Path, force: bool) -> CliResult<String> {
    let keys = create_keys(&config.identity, force)?;

    if !config_path.exists() {
        config.save(config_path)?;
    }

    Ok(format!(
        "{}\n  Peer ID:   {}\n  Publisher: {}\n  Config:    {}",
        "Identity created".green().bold(),
        keys.node.peer_id(),
        keys.publisher.id(),
        config_path.display()
    ))
}
