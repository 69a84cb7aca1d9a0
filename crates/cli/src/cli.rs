//! Command-line definition.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Log in to Kick from the terminal and manage the stored session.
#[derive(Parser, Debug)]
#[command(name = "kickstream")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (default: probe ./kickstream.toml and friends)
    #[arg(short, long, env = "KICKSTREAM_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start a login, wait for the redirect on the loopback listener and
    /// store the session.
    Login {
        /// Route to land on after a successful login
        #[arg(long)]
        return_to: Option<String>,

        /// Seconds to wait for the browser redirect
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Process a redirect URL pasted from the browser.
    Callback {
        /// Full redirect URL, including `code`/`state` or `error`
        url: String,
    },

    /// Verify the stored session against Kick and print it.
    Status,

    /// Clear the stored session and any pending login.
    Logout,

    /// Print the rolling auth log.
    Logs {
        /// Print entries as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Run the token relay server.
    Relay {
        /// Address to bind (default: relay.bind from configuration)
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
}
