//! Console commands and their at-most-once dispatch.

use std::fmt;

use tracing::{debug, warn};

use crate::COMMAND_TARGET;
use crate::connection::Connection;
use crate::errors::ConnectionError;

/// A command understood by the server console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `mission LOAD <path>`; the path is relative to the server's mission
    /// directory.
    LoadMission(String),
    /// `mission DESTROY`.
    DestroyMission,
    /// `mission`; the status reply arrives later through the reader loop.
    QueryMission,
    /// `server`, sent once after connecting.
    Server,
    /// Operator text sent verbatim.
    Raw(String),
}

impl fmt::Display for Command {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoadMission(path) => write!(formatter, "mission LOAD {path}"),
            Self::DestroyMission => formatter.write_str("mission DESTROY"),
            Self::QueryMission => formatter.write_str("mission"),
            Self::Server => formatter.write_str("server"),
            Self::Raw(text) => formatter.write_str(text),
        }
    }
}

/// Sink for complete command lines.
pub trait LineWriter {
    /// Writes one line and flushes it.
    fn write_line(&self, line: &str) -> Result<(), ConnectionError>;
}

impl LineWriter for Connection {
    fn write_line(&self, line: &str) -> Result<(), ConnectionError> {
        Connection::write_line(self, line)
    }
}

/// Formats commands and writes them without retrying.
#[derive(Debug)]
pub struct CommandDispatcher<'a, W: LineWriter + ?Sized> {
    writer: &'a W,
}

impl<'a, W: LineWriter + ?Sized> CommandDispatcher<'a, W> {
    /// Dispatches through `writer`.
    pub fn new(writer: &'a W) -> Self {
        Self { writer }
    }

    /// Writes `line` verbatim. Returns whether it was sent; a failed line is
    /// logged and dropped.
    pub fn send_command(&self, line: &str) -> bool {
        match self.writer.write_line(line) {
            Ok(()) => {
                debug!(target: COMMAND_TARGET, command = line, "command sent");
                true
            }
            Err(error) => {
                warn!(target: COMMAND_TARGET, command = line, %error, "command not sent");
                false
            }
        }
    }

    /// Sends a formatted [`Command`].
    pub fn send(&self, command: &Command) -> bool {
        self.send_command(&command.to_string())
    }

    /// Loads the mission at the server-relative `path`.
    pub fn load_mission(&self, path: &str) -> bool {
        self.send(&Command::LoadMission(path.to_string()))
    }

    /// Ends the running mission.
    pub fn end_mission(&self) -> bool {
        self.send(&Command::DestroyMission)
    }

    /// Asks the server for its mission status.
    pub fn ask_mission(&self) -> bool {
        self.send(&Command::QueryMission)
    }

    /// Sends the post-connect `server` greeting.
    pub fn greet(&self) -> bool {
        self.send(&Command::Server)
    }
}
