//! Remote console client for the IL-2 Sturmovik dedicated server.
//!
//! The server exposes a line-oriented text console over TCP. This crate owns
//! that socket: [`Connection`] opens and closes it, a background reader loop
//! (see [`spawn_reader`]) normalises the escaped text the server emits and
//! hands each logical line to a [`ConsoleSink`], and [`MissionState`] tracks
//! whether a mission is running from the status lines the server prints.
//! [`CommandDispatcher`] formats and writes the few commands a client issues.
//!
//! [`ConsoleClient`] wires these together for front-ends. State changes are
//! published through crossbeam channels so the presentation layer can consume
//! them on its own thread.

mod classify;
mod client;
mod command;
mod connection;
mod cycle;
mod errors;
mod reader;
mod sink;
mod state;
pub mod telemetry;
pub mod text;

pub use classify::{LineClass, MissionStatus, classify};
pub use client::ConsoleClient;
pub use command::{Command, CommandDispatcher, LineWriter};
pub use connection::{Connection, LineReader, ServerEndpoint};
pub use cycle::MissionCycle;
pub use errors::ConnectionError;
pub use reader::{ReaderExit, ReaderHandle, dispatch_text, spawn_reader};
pub use sink::{ConsoleSink, TracingSink};
pub use state::{MissionState, Observable};
pub use telemetry::{TelemetryError, TelemetryHandle};

/// Tracing target for socket lifecycle events.
pub const CONNECTION_TARGET: &str = "il2ssd_console::connection";
/// Tracing target for the reader loop and console text.
pub const READER_TARGET: &str = "il2ssd_console::reader";
/// Tracing target for outbound commands.
pub const COMMAND_TARGET: &str = "il2ssd_console::command";
/// Tracing target for mission state transitions.
pub const STATE_TARGET: &str = "il2ssd_console::state";

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    // Filters name the crate as a Rust path, so targets must use the
    // underscore form.
    #[rstest]
    #[case(CONNECTION_TARGET)]
    #[case(READER_TARGET)]
    #[case(COMMAND_TARGET)]
    #[case(STATE_TARGET)]
    fn targets_live_under_the_crate_path(#[case] target: &str) {
        assert_eq!(target.split("::").next(), Some(env!("CARGO_CRATE_NAME")));
    }
}
