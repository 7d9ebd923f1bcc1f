//! Clap derive structures for the `redfly` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// redfly -- talk to Redfish aggregator plugins from the command line
#[derive(Debug, Parser)]
#[command(
    name = "redfly",
    version,
    about = "Contact Redfish aggregator plugins from the command line",
    long_about = "Log in to south-bound plugins, probe their health, and read or \
        write device resources through them, with the same session reuse, \
        re-authentication, and URL translation the aggregator uses.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long, env = "REDFLY_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a fresh session with a plugin
    Login {
        /// Plugin id
        plugin: String,
    },

    /// Probe a plugin's status endpoint
    Status {
        /// Plugin id
        plugin: String,
    },

    /// Send one request to a plugin
    Contact {
        /// Plugin id
        plugin: String,

        /// Aggregator-form resource path, e.g. /redfish/v1/Systems
        path: String,

        #[command(flatten)]
        request: RequestArgs,
    },

    /// Read or write a resource on a device behind its plugin
    Device {
        /// Device UUID
        uuid: String,

        /// Aggregator-form URL, e.g. /redfish/v1/Systems/{uuid}:1
        url: String,

        #[command(flatten)]
        request: RequestArgs,
    },

    /// Print the configuration file path
    ConfigPath,
}

#[derive(Debug, Args)]
pub struct RequestArgs {
    /// HTTP method
    #[arg(long, short = 'X', default_value = "GET")]
    pub method: String,

    /// JSON request body
    #[arg(long, short = 'd')]
    pub data: Option<String>,
}
