//! Command-line editor for OWS Context documents.

pub mod commands;
pub mod config;
pub mod fetch;

pub use commands::{execute, load_context, Command, OutputArgs};
pub use config::{CliConfig, ConfigError};
