//! Shared configuration for the IL-2 dedicated server console client.
//!
//! Values are layered by `ortho_config`: built-in defaults, then an optional
//! TOML file (`--config-path` or `IL2SSD_CONFIG_PATH`), then `IL2SSD_*`
//! environment variables, then command-line flags. The configuration is only
//! ever read here; persisting operator edits belongs to the front-end.

use std::time::Duration;

use camino::Utf8Path;
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

mod defaults;
mod logging;
mod missions;

pub use defaults::{
    DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_HOST, DEFAULT_LOG_FILTER, DEFAULT_PORT,
    MISSIONS_DIRECTORY, default_connect_timeout, default_host, default_log_filter,
    default_log_filter_string, default_log_format,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use missions::{MissionPathError, missions_root, resolve_mission_path};

/// Runtime configuration shared by the console library and the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "IL2SSD")]
#[serde(default)]
pub struct Config {
    /// Host name or address of the dedicated server console.
    pub host: String,
    /// TCP port of the dedicated server console.
    pub port: u16,
    /// Connect timeout in milliseconds.
    pub connect_timeout_ms: u64,
    /// Tracing filter expression (for example `il2ssd_console=debug`).
    pub log_filter: String,
    /// Output format for diagnostics.
    pub log_format: LogFormat,
    /// Path to the dedicated server executable; empty when unset.
    pub server_path: String,
    /// Local mission file loaded when remote mode is disabled; empty when
    /// unset.
    pub mission_path: String,
    /// Load `remote_path` verbatim instead of resolving `mission_path`.
    pub remote_mode: bool,
    /// Server-relative mission path used in remote mode.
    pub remote_path: String,
    /// Server-relative missions visited by `next`, in order.
    pub cycle: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: DEFAULT_PORT,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            server_path: String::new(),
            mission_path: String::new(),
            remote_mode: true,
            remote_path: String::new(),
            cycle: Vec::new(),
        }
    }
}

impl Config {
    /// Host and port of the server console.
    #[must_use]
    pub fn endpoint(&self) -> (&str, u16) {
        (self.host.as_str(), self.port)
    }

    /// Connect timeout; a zero value falls back to the default.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        if self.connect_timeout_ms == 0 {
            default_connect_timeout()
        } else {
            Duration::from_millis(self.connect_timeout_ms)
        }
    }

    /// Tracing filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Diagnostic output format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Path handed to `mission LOAD` for the configured mission.
    ///
    /// Remote mode uses `remote_path` as-is; otherwise the local
    /// `mission_path` is resolved against the server's missions directory.
    pub fn mission_load_path(&self) -> Result<String, MissionPathError> {
        if self.remote_mode {
            return Ok(self.remote_path.clone());
        }
        let server = non_empty(&self.server_path).ok_or(MissionPathError::MissingServerPath)?;
        let mission =
            non_empty(&self.mission_path).ok_or(MissionPathError::MissingMissionPath)?;
        resolve_mission_path(server, mission)
    }
}

fn non_empty(value: &str) -> Option<&Utf8Path> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(Utf8Path::new(trimmed))
    }
}
