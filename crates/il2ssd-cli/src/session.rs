//! One-shot mission commands: connect, learn the mission state, act, and
//! report.

use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;
use il2ssd_config::Config;
use il2ssd_console::{ConsoleClient, MissionCycle, MissionStatus, TracingSink};
use tracing::warn;

use crate::AppError;

/// A connected client with a settled view of the mission.
pub(crate) struct Session {
    client: ConsoleClient,
    status: Receiver<MissionStatus>,
    names: Receiver<String>,
    timeout: Duration,
}

impl Session {
    /// Connects and waits for the reply to the initial status query.
    pub(crate) fn open(config: &Config) -> Result<Self, AppError> {
        let client = ConsoleClient::from_config(config, Arc::new(TracingSink));
        let status = client.mission().subscribe_status();
        let names = client.mission().subscribe_name();
        if !client.connect() {
            return Err(AppError::Connect {
                endpoint: client.connection().endpoint().to_string(),
            });
        }
        let session = Self {
            client,
            status,
            names,
            timeout: config.connect_timeout(),
        };
        if session.wait_until(|status| status != MissionStatus::Unknown) == MissionStatus::Unknown {
            warn!("server console did not report a mission status");
        }
        Ok(session)
    }

    /// Waits for a status matching `accept` and returns the last status seen.
    fn wait_until(&self, accept: impl Fn(MissionStatus) -> bool) -> MissionStatus {
        let mission = self.client.mission();
        let deadline = Instant::now() + self.timeout;
        loop {
            let current = mission.status();
            if accept(current) || !self.client.connected() {
                return current;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() || self.status.recv_timeout(remaining).is_err() {
                return mission.status();
            }
        }
    }

    fn describe(&self) -> String {
        match self.client.mission().status() {
            MissionStatus::Loaded => format!("mission {} is running", self.client.mission().name()),
            MissionStatus::NotLoaded => String::from("no mission is running"),
            MissionStatus::Unknown => String::from("mission status unknown"),
        }
    }

    pub(crate) fn status<W: Write>(&self, stdout: &mut W) -> Result<(), AppError> {
        writeln!(stdout, "{}", self.describe())?;
        Ok(())
    }

    pub(crate) fn load<W: Write>(&self, path: &str, stdout: &mut W) -> Result<(), AppError> {
        let mission = self.client.mission();
        if mission.running() {
            return Err(AppError::MissionRunning {
                mission: mission.name(),
            });
        }
        if !self.client.toggle_mission(path) {
            return Err(AppError::CommandNotSent {
                command: format!("mission LOAD {path}"),
            });
        }
        self.wait_until(MissionStatus::is_running);
        writeln!(stdout, "{}", self.describe())?;
        Ok(())
    }

    pub(crate) fn stop<W: Write>(&self, stdout: &mut W) -> Result<(), AppError> {
        if self.client.mission().running() {
            let commands = self.client.commands();
            if !(commands.end_mission() && commands.ask_mission()) {
                return Err(AppError::CommandNotSent {
                    command: String::from("mission DESTROY"),
                });
            }
            self.wait_until(|status| !status.is_running());
        }
        writeln!(stdout, "{}", self.describe())?;
        Ok(())
    }

    pub(crate) fn next<W: Write>(&self, cycle: &[String], stdout: &mut W) -> Result<(), AppError> {
        let mut cycle = MissionCycle::new(cycle.iter().cloned());
        if cycle.is_empty() {
            return Err(AppError::EmptyCycle);
        }
        let mission = self.client.mission();
        if mission.running() {
            cycle.resume_after(&mission.name());
        }
        let Some(next) = self.client.next_mission(&mut cycle) else {
            return Err(AppError::CommandNotSent {
                command: String::from("mission LOAD"),
            });
        };
        let deadline = Instant::now() + self.timeout;
        while mission.name() != next && self.client.connected() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() || self.names.recv_timeout(remaining).is_err() {
                break;
            }
        }
        writeln!(stdout, "{}", self.describe())?;
        Ok(())
    }
}
