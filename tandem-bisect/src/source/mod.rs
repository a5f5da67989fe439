//! Repository adapters for the version-control systems tandem-bisect drives.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tandem_bisect_core::{Repository, RepositoryError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unsupported repository type '{0}'")]
pub struct UnsupportedVcs(pub String);

/// The version-control systems with an adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepositoryKind {
    Git,
    Hg,
}

impl fmt::Display for RepositoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepositoryKind::Git => write!(f, "git"),
            RepositoryKind::Hg => write!(f, "hg"),
        }
    }
}

impl FromStr for RepositoryKind {
    type Err = UnsupportedVcs;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "git" => Ok(RepositoryKind::Git),
            "hg" | "mercurial" => Ok(RepositoryKind::Hg),
            _ => Err(UnsupportedVcs(s.to_string())),
        }
    }
}

/// Settings shared by every adapter in one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepositoryOptions {
    /// List revisions through every merge parent instead of the first parent only.
    pub follow_merges: bool,
}

/// Open the repository at `local_path`, cloning it from `url` first when the
/// directory does not exist yet.
///
/// # Errors
///
/// Returns an error if the clone fails, or if there is no clone and no URL.
pub fn open_repository(
    kind: RepositoryKind,
    url: Option<&str>,
    local_path: &Path,
    options: RepositoryOptions,
) -> Result<Box<dyn Repository>, RepositoryError> {
    tracing::info!("Setting up {} repository at {}", kind, local_path.display());

    if !local_path.is_dir() {
        let url = url.ok_or_else(|| RepositoryError::Clone {
            url: local_path.display().to_string(),
            reason: "no local clone and no URL to clone from".to_string(),
        })?;
        clone(kind, url, local_path)?;
    } else {
        tracing::debug!("{} already exists, using it", local_path.display());
    }

    Ok(match kind {
        RepositoryKind::Git => Box::new(GitRepository::new(local_path, options)),
        RepositoryKind::Hg => Box::new(HgRepository::new(local_path, options)),
    })
}

fn clone(kind: RepositoryKind, url: &str, local_path: &Path) -> Result<(), RepositoryError> {
    if let Some(parent) = local_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| RepositoryError::Clone {
                url: url.to_string(),
                reason: format!("Failed to create parent directory {}: {}", parent.display(), e),
            })?;
        }
    }

    tracing::info!("Cloning {} into {}", url, local_path.display());
    let path = local_path.to_string_lossy();
    let program = kind.to_string();
    command::run(&program, None, &["clone", url, &path]).map_err(|e| RepositoryError::Clone {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    Ok(())
}

mod command;
mod git;
mod hg;
pub use git::GitRepository;
pub use hg::HgRepository;
