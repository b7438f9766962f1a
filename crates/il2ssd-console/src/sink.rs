//! Destinations for display-ready console text.

use crossbeam_channel::Sender;
use tracing::info;

use crate::READER_TARGET;

/// Receives each logical console line in arrival order.
///
/// Called from the reader thread; implementations hand the text over to the
/// presentation context instead of touching it directly.
pub trait ConsoleSink: Send + Sync {
    /// Delivers one display line.
    fn display(&self, line: &str);
}

impl ConsoleSink for Sender<String> {
    fn display(&self, line: &str) {
        // A dropped receiver means nobody is watching; the reader keeps
        // tracking mission state regardless.
        let _ = self.send(line.to_string());
    }
}

/// Writes console text to the tracing subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ConsoleSink for TracingSink {
    fn display(&self, line: &str) {
        info!(target: READER_TARGET, line, "console");
    }
}
