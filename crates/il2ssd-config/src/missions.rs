//! Resolves local mission files into the server-relative form expected by
//! `mission LOAD`.
//!
//! The dedicated server loads missions relative to the `Missions` directory
//! beside its executable and always expects forward slashes, regardless of
//! the host operating system.

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use thiserror::Error;

use crate::defaults::MISSIONS_DIRECTORY;

/// Errors raised while turning a local mission path into a load path.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MissionPathError {
    /// No server executable has been configured.
    #[error("the server executable path is not configured")]
    MissingServerPath,
    /// The server executable path has no parent directory.
    #[error("server path '{path}' has no parent directory")]
    MissingServerParent { path: Utf8PathBuf },
    /// No local mission file has been configured.
    #[error("the local mission path is not configured")]
    MissingMissionPath,
    /// The mission does not live beneath the server's mission directory.
    #[error("mission '{mission}' is outside the missions directory '{root}'")]
    OutsideMissionRoot {
        mission: Utf8PathBuf,
        root: Utf8PathBuf,
    },
    /// The mission path names the missions directory itself.
    #[error("mission path '{mission}' does not name a mission file")]
    NotAMission { mission: Utf8PathBuf },
}

/// Returns the directory missions are loaded from for a server executable.
pub fn missions_root(server_path: &Utf8Path) -> Result<Utf8PathBuf, MissionPathError> {
    let server = normalise(server_path.as_str());
    match server.parent().filter(|parent| !parent.as_str().is_empty()) {
        Some(parent) => Ok(parent.join(MISSIONS_DIRECTORY)),
        None => Err(MissionPathError::MissingServerParent {
            path: server_path.to_path_buf(),
        }),
    }
}

/// Resolves `mission_path` relative to the missions directory of
/// `server_path`, rendered with `/` separators.
///
/// ```text
/// server:  C:\il2\il2server.exe
/// mission: C:\il2\Missions\net\dogfight\x.mis
/// result:  net/dogfight/x.mis
/// ```
pub fn resolve_mission_path(
    server_path: &Utf8Path,
    mission_path: &Utf8Path,
) -> Result<String, MissionPathError> {
    let root = missions_root(server_path)?;
    let mission = normalise(mission_path.as_str());
    let relative =
        mission
            .strip_prefix(&root)
            .map_err(|_| MissionPathError::OutsideMissionRoot {
                mission: mission.clone(),
                root: root.clone(),
            })?;

    let segments: Vec<&str> = relative
        .components()
        .map(|component| component.as_str())
        .collect();
    if segments.is_empty() {
        return Err(MissionPathError::NotAMission { mission });
    }
    Ok(segments.join("/"))
}

/// Lexically normalises a path, accepting either separator style.
fn normalise(path: &str) -> Utf8PathBuf {
    let unified = path.replace('\\', "/");
    let mut normalised = Utf8PathBuf::new();
    for component in Utf8Path::new(&unified).components() {
        match component {
            Utf8Component::CurDir => {}
            Utf8Component::ParentDir => {
                let can_pop = matches!(
                    normalised.components().next_back(),
                    Some(Utf8Component::Normal(_))
                );
                if can_pop {
                    normalised.pop();
                } else {
                    normalised.push("..");
                }
            }
            other => normalised.push(other.as_str()),
        }
    }
    normalised
}
