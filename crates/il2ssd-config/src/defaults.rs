use std::time::Duration;

/// Host of the dedicated server console when nothing else is configured.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Console port the dedicated server listens on out of the box.
pub const DEFAULT_PORT: u16 = 21003;

/// Connect timeout in milliseconds.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Directory beneath the server installation that holds mission files.
pub const MISSIONS_DIRECTORY: &str = "Missions";

/// Owned host value used where allocation is required (e.g. serde).
pub fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

/// Default log filter expression used by the binaries.
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

/// Default logging format for the binaries.
pub fn default_log_format() -> crate::logging::LogFormat {
    crate::logging::LogFormat::Compact
}

/// Default connect timeout as a [`Duration`].
pub fn default_connect_timeout() -> Duration {
    Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS)
}
