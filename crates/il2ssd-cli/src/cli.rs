//! Command-line interface definitions.

use clap::{Parser, Subcommand};

/// Remote console client for the IL-2 Sturmovik dedicated server.
#[derive(Parser, Debug)]
#[command(name = "il2ssd", disable_help_subcommand = true)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: CliCommand,
}

/// Actions available against the server console.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub(crate) enum CliCommand {
    /// Opens an interactive console; input lines are sent verbatim.
    Console,
    /// Prints whether a mission is running.
    Status,
    /// Loads a mission.
    Load {
        /// Server-relative mission path; defaults to the configured mission.
        #[arg(value_name = "PATH")]
        path: Option<String>,
    },
    /// Ends the running mission.
    Stop,
    /// Ends the running mission and loads the next one from the cycle.
    Next,
}
