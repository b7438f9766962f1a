//! Error types for the CLI runtime.

use std::io;
use std::sync::Arc;

use il2ssd_config::MissionPathError;
use il2ssd_console::TelemetryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error("failed to connect to server console at {endpoint}")]
    Connect { endpoint: String },
    #[error("cannot resolve mission path: {0}")]
    MissionPath(#[from] MissionPathError),
    #[error("no mission path given and none configured")]
    MissingMission,
    #[error("mission {mission} is already running; stop it first")]
    MissionRunning { mission: String },
    #[error("the mission cycle is empty")]
    EmptyCycle,
    #[error("failed to send `{command}` to the server console")]
    CommandNotSent { command: String },
    #[error("failed to read console input: {0}")]
    Input(io::Error),
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}
