//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer.

pub mod entity;
pub mod log;

pub use entity::{handle_entity_command, EntityCommands};
pub use log::{handle_log_command, LogArgs, LogFormat};
