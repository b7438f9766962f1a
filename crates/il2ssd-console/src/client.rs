//! Client session tying the connection, reader loop and mission state
//! together behind the intents a front-end issues.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crossbeam_channel::Receiver;
use il2ssd_config::Config;
use tracing::{info, warn};

use crate::CONNECTION_TARGET;
use crate::command::CommandDispatcher;
use crate::connection::{Connection, ServerEndpoint};
use crate::cycle::MissionCycle;
use crate::reader::{ReaderHandle, spawn_reader};
use crate::sink::ConsoleSink;
use crate::state::MissionState;

/// One console session against a dedicated server.
///
/// All methods take `&self`; the client can be shared with the thread that
/// handles operator input while the reader loop runs in the background.
pub struct ConsoleClient {
    connection: Arc<Connection>,
    mission: Arc<MissionState>,
    sink: Arc<dyn ConsoleSink>,
    timeout: Duration,
    reader: Mutex<Option<ReaderHandle>>,
}

impl ConsoleClient {
    /// Creates a disconnected client.
    pub fn new(endpoint: ServerEndpoint, timeout: Duration, sink: Arc<dyn ConsoleSink>) -> Self {
        Self {
            connection: Arc::new(Connection::new(endpoint)),
            mission: Arc::new(MissionState::new()),
            sink,
            timeout,
            reader: Mutex::new(None),
        }
    }

    /// Creates a disconnected client for the configured server.
    pub fn from_config(config: &Config, sink: Arc<dyn ConsoleSink>) -> Self {
        let (host, port) = config.endpoint();
        Self::new(
            ServerEndpoint::new(host, port),
            config.connect_timeout(),
            sink,
        )
    }

    /// Uses `mission` instead of a private state instance.
    #[must_use]
    pub fn with_mission_state(mut self, mission: Arc<MissionState>) -> Self {
        self.mission = mission;
        self
    }

    /// Connects, starts the reader loop, greets the server and asks for the
    /// mission status.
    ///
    /// Returns whether the client is connected afterwards. On failure no
    /// reader is started.
    pub fn connect(&self) -> bool {
        if self.connection.connected() {
            return true;
        }
        // A reader left over from a lost connection has already exited.
        if let Some(stale) = self.reader_slot().take() {
            stale.cancel();
            let _ = stale.join();
        }
        if !self.connection.connect(self.timeout) {
            return false;
        }
        let Some(reader) = self.connection.take_reader() else {
            warn!(target: CONNECTION_TARGET, "connected without a socket reader");
            self.connection.disconnect();
            return false;
        };
        match spawn_reader(
            reader,
            Arc::clone(&self.connection),
            Arc::clone(&self.mission),
            Arc::clone(&self.sink),
        ) {
            Ok(handle) => *self.reader_slot() = Some(handle),
            Err(error) => {
                warn!(target: CONNECTION_TARGET, %error, "failed to start console reader");
                self.connection.disconnect();
                return false;
            }
        }

        let commands = self.commands();
        commands.greet();
        commands.ask_mission();
        true
    }

    /// Stops the reader loop and closes the socket. Safe to repeat.
    pub fn disconnect(&self) {
        let handle = self.reader_slot().take();
        if let Some(handle) = handle.as_ref() {
            handle.cancel();
        }
        self.connection.disconnect();
        if let Some(handle) = handle {
            let _ = handle.join();
        }
        self.mission.reset();
    }

    /// Dispatcher writing to this client's connection.
    pub fn commands(&self) -> CommandDispatcher<'_, Connection> {
        CommandDispatcher::new(self.connection.as_ref())
    }

    /// Stops the running mission, or loads `path` when none is running.
    ///
    /// Stopping also re-queries the status so the tracker learns about the
    /// change.
    pub fn toggle_mission(&self, path: &str) -> bool {
        let commands = self.commands();
        if self.mission.running() {
            info!(target: CONNECTION_TARGET, mission = %self.mission.name(), "stopping mission");
            commands.end_mission() && commands.ask_mission()
        } else {
            info!(target: CONNECTION_TARGET, mission = path, "loading mission");
            commands.load_mission(path)
        }
    }

    /// Ends the running mission, if any, and loads the next mission of
    /// `cycle`. Returns the mission that was sent.
    pub fn next_mission(&self, cycle: &mut MissionCycle) -> Option<String> {
        let next = cycle.advance()?.to_string();
        let commands = self.commands();
        if self.mission.running() {
            commands.end_mission();
        }
        commands.load_mission(&next).then_some(next)
    }

    /// Whether the socket is open.
    pub fn connected(&self) -> bool {
        self.connection.connected()
    }

    /// Subscribes to connected/disconnected transitions.
    pub fn subscribe_connected(&self) -> Receiver<bool> {
        self.connection.subscribe_connected()
    }

    /// The underlying connection.
    pub fn connection(&self) -> &Arc<Connection> {
        &self.connection
    }

    /// Mission state tracked from the server's status lines.
    pub fn mission(&self) -> &Arc<MissionState> {
        &self.mission
    }

    fn reader_slot(&self) -> MutexGuard<'_, Option<ReaderHandle>> {
        self.reader.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for ConsoleClient {
    fn drop(&mut self) {
        self.disconnect();
    }
}
