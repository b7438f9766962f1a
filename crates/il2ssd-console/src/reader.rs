//! Background loop draining the console socket.
//!
//! One thread runs per connection. Each physical line is normalised, split
//! into logical lines and, in arrival order, sent to the display sink and
//! applied to the mission state. Cancellation is cooperative and only
//! observed between reads; [`Connection::disconnect`] shuts the socket down
//! so a pending read returns promptly.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use tracing::{debug, info, warn};

use crate::READER_TARGET;
use crate::classify::classify;
use crate::connection::{Connection, LineReader};
use crate::sink::ConsoleSink;
use crate::state::MissionState;
use crate::text::{clean, is_prompt, logical_lines, strip_terminator};

/// Why the reader loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderExit {
    /// Cancelled by the owner.
    Cancelled,
    /// The server closed the stream.
    EndOfStream,
    /// Reading failed.
    Failed,
    /// The connection was already closed.
    Closed,
}

/// Handle to a running reader thread.
#[derive(Debug)]
pub struct ReaderHandle {
    cancelled: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<ReaderExit>>,
}

impl ReaderHandle {
    /// Requests the loop to stop after its current read.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Waits for the thread and reports how the loop ended.
    pub fn join(mut self) -> Option<ReaderExit> {
        let handle = self.handle.take()?;
        match handle.join() {
            Ok(exit) => Some(exit),
            Err(_) => {
                warn!(target: READER_TARGET, "console reader thread panicked");
                None
            }
        }
    }
}

impl Drop for ReaderHandle {
    fn drop(&mut self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

/// Spawns the reader loop for `connection`.
pub fn spawn_reader(
    reader: LineReader,
    connection: Arc<Connection>,
    mission: Arc<MissionState>,
    sink: Arc<dyn ConsoleSink>,
) -> io::Result<ReaderHandle> {
    let cancelled = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancelled);
    let handle = thread::Builder::new()
        .name(String::from("il2ssd-console-reader"))
        .spawn(move || run_reader(reader, &connection, &mission, sink.as_ref(), &flag))?;
    Ok(ReaderHandle {
        cancelled,
        handle: Some(handle),
    })
}

fn run_reader(
    mut reader: LineReader,
    connection: &Connection,
    mission: &MissionState,
    sink: &dyn ConsoleSink,
    cancelled: &AtomicBool,
) -> ReaderExit {
    debug!(target: READER_TARGET, endpoint = %connection.endpoint(), "console reader started");
    let exit = loop {
        if cancelled.load(Ordering::SeqCst) {
            break ReaderExit::Cancelled;
        }
        if !connection.connected() {
            break ReaderExit::Closed;
        }
        match reader.read_line() {
            Ok(Some(raw)) => dispatch_text(&raw, mission, sink),
            Ok(None) => break ReaderExit::EndOfStream,
            Err(error) if is_transient(&error) => {
                warn!(target: READER_TARGET, %error, "skipping unreadable console line");
            }
            Err(error) => {
                if !cancelled.load(Ordering::SeqCst) {
                    warn!(target: READER_TARGET, %error, "console read failed");
                }
                break ReaderExit::Failed;
            }
        }
    };

    if cancelled.load(Ordering::SeqCst) {
        debug!(target: READER_TARGET, "console reader cancelled");
        return ReaderExit::Cancelled;
    }
    if matches!(exit, ReaderExit::EndOfStream | ReaderExit::Failed) {
        connection.mark_lost();
        mission.reset();
    }
    info!(target: READER_TARGET, ?exit, "console reader stopped");
    exit
}

fn is_transient(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
            | io::ErrorKind::TimedOut
            | io::ErrorKind::InvalidData
    )
}

/// Normalises one physical socket line and processes each logical line.
///
/// Prompt echoes are dropped. Every other line is displayed first and then
/// classified, so state changes follow the text that caused them.
pub fn dispatch_text(raw: &str, mission: &MissionState, sink: &dyn ConsoleSink) {
    let normalized = clean(strip_terminator(raw));
    for line in logical_lines(&normalized) {
        if is_prompt(line) {
            continue;
        }
        sink.display(line);
        mission.apply(&classify(line));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CollectingSink {
        lines: Mutex<Vec<String>>,
    }

    impl CollectingSink {
        fn lines(&self) -> Vec<String> {
            self.lines.lock().map(|lines| lines.clone()).unwrap_or_default()
        }
    }

    impl ConsoleSink for CollectingSink {
        fn display(&self, line: &str) {
            if let Ok(mut lines) = self.lines.lock() {
                lines.push(line.to_string());
            }
        }
    }

    #[test]
    fn status_line_is_displayed_once_and_applied() {
        let mission = MissionState::new();
        let sink = CollectingSink::default();

        dispatch_text("Mission net/dogfight/test.mis is Loaded\n", &mission, &sink);

        assert_eq!(sink.lines(), vec!["Mission net/dogfight/test.mis is Loaded"]);
        assert!(mission.running());
        assert_eq!(mission.name(), "net/dogfight/test.mis");
    }

    #[test]
    fn escaped_lines_are_split_in_order() {
        let mission = MissionState::new();
        let sink = CollectingSink::default();

        dispatch_text(
            "Mission: a.mis is Loaded\\nMission NOT loaded\\n\r\n",
            &mission,
            &sink,
        );

        assert_eq!(sink.lines(), vec!["Mission: a.mis is Loaded", "Mission NOT loaded"]);
        assert!(!mission.running());
    }

    #[test]
    fn prompts_are_neither_displayed_nor_classified() {
        let mission = MissionState::new();
        let sink = CollectingSink::default();

        dispatch_text("<consoleN><3>\\n", &mission, &sink);

        assert!(sink.lines().is_empty());
    }

    #[test]
    fn chat_is_displayed_without_state_change() {
        let mission = MissionState::new();
        let sink = CollectingSink::default();
        mission.apply(&crate::LineClass::Load {
            mission: String::from("x.mis"),
        });

        dispatch_text("Chat: Pilot: \\tMission NOT loaded\\n\n", &mission, &sink);

        assert_eq!(sink.lines(), vec!["Chat: Pilot: \tMission NOT loaded"]);
        assert!(mission.running());
    }

    #[test]
    fn escaped_leading_space_is_restored() {
        let mission = MissionState::new();
        let sink = CollectingSink::default();

        dispatch_text("\\u0020\\u0020indented\\n\n", &mission, &sink);

        assert_eq!(sink.lines(), vec!["  indented"]);
    }
}
