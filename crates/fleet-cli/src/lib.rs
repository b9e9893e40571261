//! Command-line front end for the fleet watch backend.

pub mod cli_args;
pub mod client;
pub mod commands;
pub mod config;

pub use cli_args::{Cli, Command};
pub use client::{BackendClient, ClientError};
pub use commands::{CommandError, driver_check, execute};
pub use config::{CliConfig, ConfigLoadResult, ConfigSource, load_config};
