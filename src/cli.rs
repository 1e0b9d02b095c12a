//! CLI definitions for devlink.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// devlink CLI.
#[derive(Parser)]
#[command(name = "devlink")]
#[command(about = "Authenticated WebSocket link to an embedded device")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "devlink.toml", global = true)]
    pub config: PathBuf,

    /// Device page location, overrides `device.location` (may carry ?host=...)
    #[arg(short, long, env = "DEVLINK_URL", global = true)]
    pub url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub(crate) enum Commands {
    /// Connect and stay connected (default)
    ///
    /// Inbound frames are printed to stdout. Each stdin line is sent as an
    /// action: `name {json}`, a bare `name`, or a raw `{...}` frame.
    Run,

    /// Print the endpoints resolved for the device location
    Endpoints,
}
