//! Concord node daemon.
//!
//! This crate provides the `concordd` binary: it loads the node's keys and
//! configuration, runs a [`concord_node::Node`], and serves the HTTP control
//! surface operators use to drive it.
//!
//! # Commands
//!
//! - `init`: create the node and publisher keys and a default config
//! - `id`: print the node's peer and publisher IDs
//! - `run`: run the node and its control surface until interrupted

pub mod cli;
pub mod commands;
pub mod config;
pub mod control;
pub mod error;
pub mod keys;
pub mod signals;

pub use cli::{Cli, Commands};
pub use config::CliConfig;
pub use error::{CliError, CliResult};
