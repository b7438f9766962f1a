//! Error types for the console connection.

use std::io;

use thiserror::Error;

/// Errors raised while opening or using the console connection.
///
/// None of these are fatal to the client: connect failures leave the
/// connection closed, write failures drop the command.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("failed to resolve server address {endpoint}: {source}")]
    Resolve {
        endpoint: String,
        #[source]
        source: io::Error,
    },
    #[error("no addresses resolved for {endpoint}")]
    ResolveEmpty { endpoint: String },
    #[error("failed to connect to server console at {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to prepare socket streams: {0}")]
    Streams(#[source] io::Error),
    #[error("not connected to the server console")]
    NotConnected,
    #[error("failed to write to the server console: {0}")]
    Write(#[source] io::Error),
}
