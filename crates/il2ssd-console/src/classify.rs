//! Classification of normalised console lines into mission state changes.

use std::fmt;

const MISSION_PREFIX: &str = "Mission";
const LOADED_MARKER: &str = "is Loaded";
const NOT_LOADED_MARKER: &str = "NOT loaded";

/// Outcome of classifying one logical console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineClass {
    /// The server reports a loaded mission.
    Load {
        /// Mission path as printed by the server; may be empty.
        mission: String,
    },
    /// The server reports that no mission is loaded.
    Unload,
    /// Anything else: chat, banners, command echoes, malformed text.
    Ignore,
}

/// Mission state as last reported by the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissionStatus {
    /// No status line has been seen on this connection.
    #[default]
    Unknown,
    /// The last status line reported a loaded mission.
    Loaded,
    /// The last status line reported no mission.
    NotLoaded,
}

impl MissionStatus {
    /// Whether a mission is currently running.
    #[must_use]
    pub const fn is_running(self) -> bool {
        matches!(self, Self::Loaded)
    }
}

impl fmt::Display for MissionStatus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Unknown => "unknown",
            Self::Loaded => "loaded",
            Self::NotLoaded => "not loaded",
        };
        formatter.write_str(label)
    }
}

/// Classifies a normalised line.
///
/// Only lines that start with `Mission` are status lines. The loaded test is
/// applied before the not-loaded test.
#[must_use]
pub fn classify(line: &str) -> LineClass {
    let Some(rest) = mission_body(line) else {
        return LineClass::Ignore;
    };

    if let Some(index) = rest.find(LOADED_MARKER) {
        let mission = rest.get(..index).unwrap_or_default().trim();
        return LineClass::Load {
            mission: mission.to_string(),
        };
    }

    if rest.contains(NOT_LOADED_MARKER) {
        return LineClass::Unload;
    }

    LineClass::Ignore
}

/// Returns the text after the `Mission` prefix (and optional colon).
fn mission_body(line: &str) -> Option<&str> {
    let rest = line.trim_start().strip_prefix(MISSION_PREFIX)?;
    // `Missions` or `MissionFoo` are not status lines.
    if rest
        .chars()
        .next()
        .is_some_and(|next| next.is_alphanumeric())
    {
        return None;
    }
    Some(rest.strip_prefix(':').unwrap_or(rest))
}
