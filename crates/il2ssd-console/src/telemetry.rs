//! Diagnostics for the console client.
//!
//! Everything the library logs goes to stderr so that stdout stays free for
//! console text. Events carry the `il2ssd_console::*` targets declared at the
//! crate root, which is what filters such as `il2ssd_console::reader=debug`
//! select on.

use std::io::{self, IsTerminal};

use il2ssd_config::{Config, LogFormat};
use once_cell::sync::OnceCell;
use tracing::Subscriber;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::{self, MakeWriter};

static INSTALLED: OnceCell<LogFormat> = OnceCell::new();

/// Proof that the process-wide subscriber is in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryHandle {
    format: LogFormat,
}

impl TelemetryHandle {
    /// Format chosen by whichever call installed the subscriber.
    #[must_use]
    pub const fn format(&self) -> LogFormat {
        self.format
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("invalid log filter '{filter}': {reason}")]
    Filter { filter: String, reason: String },
    #[error("a tracing subscriber is already installed: {0}")]
    Install(SetGlobalDefaultError),
}

/// Installs the stderr subscriber described by `config`.
///
/// Only the first successful call installs anything; later calls report the
/// format already in use.
pub fn initialise(config: &Config) -> Result<TelemetryHandle, TelemetryError> {
    let format = *INSTALLED.get_or_try_init(|| {
        let subscriber = build_subscriber(
            config.log_filter(),
            config.log_format(),
            io::stderr,
            io::stderr().is_terminal(),
        )?;
        tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Install)?;
        Ok::<_, TelemetryError>(config.log_format())
    })?;
    Ok(TelemetryHandle { format })
}

fn build_subscriber<W>(
    filter: &str,
    format: LogFormat,
    writer: W,
    ansi: bool,
) -> Result<Box<dyn Subscriber + Send + Sync>, TelemetryError>
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    let env_filter = EnvFilter::try_new(filter).map_err(|error| TelemetryError::Filter {
        filter: filter.to_string(),
        reason: error.to_string(),
    })?;
    let builder = fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(writer)
        .with_ansi(ansi)
        .with_target(true)
        .with_thread_names(true)
        .with_timer(fmt::time::UtcTime::rfc_3339());

    Ok(match format {
        LogFormat::Json => Box::new(builder.json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(builder.compact().finish()),
    })
}
