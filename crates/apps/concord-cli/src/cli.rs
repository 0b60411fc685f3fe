//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use concord_types::NodeStatus;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Concord node daemon.
#[derive(Parser, Debug)]
#[command(name = "concordd")]
#[command(author = "Concord Contributors")]
#[command(version)]
#[command(about = "Node daemon for the Concord statement network")]
#[command(
    long_about = "Runs a Concord node and its HTTP control surface.\n\nRun 'concordd init' to create the node keys, then 'concordd run'."
)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file.
    #[arg(short, long, global = true, env = "CONCORD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the node and publisher keys and a default configuration file.
    Init {
        /// Replace existing key files.
        #[arg(long)]
        force: bool,
    },

    /// Show the node's peer ID and publisher ID.
    Id,

    /// Run the node and its control surface until interrupted.
    ///
    /// Keys are created on first run if none exist.
    Run {
        /// Control surface bind address (overrides the config file).
        #[arg(long)]
        control: Option<SocketAddr>,

        /// Network state to enter at startup.
        #[arg(long, value_enum, default_value = "offline")]
        start: StartState,
    },
}

/// Startup network state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum StartState {
    #[default]
    Offline,
    Online,
    Public,
}

impl From<StartState> for NodeStatus {
    fn from(state: StartState) -> Self {
        match state {
            StartState::Offline => NodeStatus::Offline,
            StartState::Online => NodeStatus::Online,
            StartState::Public => NodeStatus::Public,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run() {
        let cli = Cli::parse_from([
            "concordd",
            "--verbose",
            "run",
            "--control",
            "127.0.0.1:7000",
            "--start",
            "public",
        ]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Run { control, start } => {
                assert_eq!(control, Some("127.0.0.1:7000".parse().unwrap()));
                assert_eq!(NodeStatus::from(start), NodeStatus::Public);
            }
            other => panic!("expected run, got {:?}", other),
        }
    }

    #[test]
    fn test_run_defaults_to_offline() {
        let cli = Cli::parse_from(["concordd", "run"]);
        assert!(matches!(
            cli.command,
            Commands::Run {
                control: None,
                start: StartState::Offline
            }
        ));
    }

    #[test]
    fn test_rejects_unknown_start_state() {
        assert!(Cli::try_parse_from(["concordd", "run", "--start", "private"]).is_err());
    }
}
