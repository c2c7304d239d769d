use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shared::constants::{APP_DIR_NAME, DATA_DIR_ENV};

pub type LoadError = Box<dyn std::error::Error + Send + Sync>;

/// One failed step of a resolution chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveAttempt {
    pub candidate: String,
    pub reason: String,
}

impl fmt::Display for ResolveAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.candidate, self.reason)
    }
}

#[derive(Error, Debug)]
pub enum ResourceResolveError {
    #[error("could not load {name} from any location ({})", join_attempts(.attempts))]
    Exhausted {
        name: String,
        attempts: Vec<ResolveAttempt>,
    },
}

fn join_attempts(attempts: &[ResolveAttempt]) -> String {
    attempts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// A place a data file may live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceCandidate {
    /// Directory handed in at runtime (configuration or environment).
    RuntimeDir(Option<PathBuf>),
    /// Directory relative to the current working directory.
    WorkingDir(PathBuf),
    /// Per-user platform data directory.
    PlatformData,
    /// Fixed system-wide install location.
    SystemDir(PathBuf),
    /// The bare file name, resolved by the loader itself.
    BareName,
}

impl ResourceCandidate {
    /// Path this candidate proposes for `name`, or why it has none.
    pub fn path_for(&self, name: &str) -> Result<PathBuf, String> {
        match self {
            ResourceCandidate::RuntimeDir(Some(dir)) => Ok(dir.join(name)),
            ResourceCandidate::RuntimeDir(None) => Err("no runtime data directory set".into()),
            ResourceCandidate::WorkingDir(dir) => Ok(dir.join(name)),
            ResourceCandidate::PlatformData => platform_data_dir()
                .map(|d| d.join(name))
                .ok_or_else(|| "could not determine platform data directory".into()),
            ResourceCandidate::SystemDir(dir) => Ok(dir.join(name)),
            ResourceCandidate::BareName => Ok(PathBuf::from(name)),
        }
    }

    fn label(&self) -> &'static str {
        match self {
            ResourceCandidate::RuntimeDir(_) => "runtime dir",
            ResourceCandidate::WorkingDir(_) => "working dir",
            ResourceCandidate::PlatformData => "platform data dir",
            ResourceCandidate::SystemDir(_) => "system dir",
            ResourceCandidate::BareName => "bare name",
        }
    }
}

/// Standard lookup order for model and detector data files.
///
/// 1. `runtime_dir`, falling back to `$EMOSCOPE_DATA_DIR`
/// 2. `./models/`
/// 3. Platform data directory, then (unix) `/usr/local/share/emoscope` and
///    `/usr/share/emoscope`
/// 4. The bare file name
pub fn default_chain(runtime_dir: Option<PathBuf>) -> Vec<ResourceCandidate> {
    let runtime_dir = runtime_dir.or_else(|| std::env::var_os(DATA_DIR_ENV).map(PathBuf::from));
    let mut chain = vec![
        ResourceCandidate::RuntimeDir(runtime_dir),
        ResourceCandidate::WorkingDir(PathBuf::from("models")),
        ResourceCandidate::PlatformData,
    ];
    #[cfg(unix)]
    {
        chain.push(ResourceCandidate::SystemDir(PathBuf::from(
            "/usr/local/share/emoscope",
        )));
        chain.push(ResourceCandidate::SystemDir(PathBuf::from("/usr/share/emoscope")));
    }
    chain.push(ResourceCandidate::BareName);
    chain
}

/// Tries `load` on each candidate path in order; the first success wins.
///
/// Every failure (missing directory, unreadable file, rejected contents) is
/// recorded and the next candidate is tried.
pub fn resolve_with<T, F>(
    name: &str,
    candidates: &[ResourceCandidate],
    mut load: F,
) -> Result<(PathBuf, T), ResourceResolveError>
where
    F: FnMut(&Path) -> Result<T, LoadError>,
{
    let mut attempts = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let path = match candidate.path_for(name) {
            Ok(path) => path,
            Err(reason) => {
                attempts.push(ResolveAttempt {
                    candidate: candidate.label().to_string(),
                    reason,
                });
                continue;
            }
        };
        match load(&path) {
            Ok(value) => {
                log::debug!("Resolved {name} via {} at {}", candidate.label(), path.display());
                return Ok((path, value));
            }
            Err(e) => {
                log::debug!("{name} not usable at {}: {e}", path.display());
                attempts.push(ResolveAttempt {
                    candidate: format!("{} ({})", candidate.label(), path.display()),
                    reason: e.to_string(),
                });
            }
        }
    }
    Err(ResourceResolveError::Exhausted {
        name: name.to_string(),
        attempts,
    })
}

/// Platform-specific data directory.
///
/// - macOS: `~/Library/Application Support/Emoscope/models/`
/// - Linux: `$XDG_DATA_HOME/Emoscope/models/` or `~/.local/share/Emoscope/models/`
/// - Windows: `%APPDATA%/Emoscope/models/`
pub fn platform_data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join(APP_DIR_NAME).join("models"))
}
