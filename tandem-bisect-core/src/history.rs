//! Merging per-project revision chains into one timeline.
//!
//! Each project contributes a chain of revisions ordered oldest first. The
//! merge walks all chains together and emits one [`Line`] per revision
//! consumed, so the timeline holds `sum(len(chain))` lines and every line has
//! exactly one revision per project.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::repository::{Project, RepositoryError, RevisionChain};
use crate::revision::Revision;

/// Errors that prevent a timeline from being built.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// There was nothing to merge.
    #[error("No projects to merge")]
    NoProjects,

    /// A project has no revisions between its good and bad boundaries.
    #[error("Project '{project}' has no revisions between good and bad")]
    EmptyRange { project: String },

    /// Two chains claim the same project name.
    #[error("Project '{0}' appears more than once")]
    DuplicateProject(String),

    /// A project's adapter failed to list its revisions.
    #[error("Failed to list revisions for '{project}': {source}")]
    Listing {
        project: String,
        #[source]
        source: RepositoryError,
    },
}

/// One row of the timeline: a revision for every project, sorted by project name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line {
    revisions: Vec<Revision>,
}

impl Line {
    pub fn revisions(&self) -> &[Revision] {
        &self.revisions
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Revision> {
        self.revisions.iter()
    }

    /// The revision this line holds for `project`.
    pub fn get(&self, project: &str) -> Option<&Revision> {
        self.revisions.iter().find(|rev| rev.project() == project)
    }

    pub fn len(&self) -> usize {
        self.revisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.revisions.is_empty()
    }
}

impl<'a> IntoIterator for &'a Line {
    type Item = &'a Revision;
    type IntoIter = std::slice::Iter<'a, Revision>;

    fn into_iter(self) -> Self::IntoIter {
        self.revisions.iter()
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, rev) in self.revisions.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", rev)?;
        }
        Ok(())
    }
}

/// The merged, ordered sequence of lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeline {
    /// Project names, sorted, in the order each line lists them.
    projects: Vec<String>,
    lines: Vec<Line>,
}

impl Timeline {
    pub fn projects(&self) -> &[String] {
        &self.projects
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn get(&self, index: usize) -> Option<&Line> {
        self.lines.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Line> {
        self.lines.iter()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// List every project's revisions and merge them into a timeline.
///
/// # Errors
///
/// Fails on the first project whose revisions cannot be listed or whose range
/// is empty, before any merging happens.
pub fn build_timeline(projects: &[Project]) -> Result<Timeline, HistoryError> {
    let chains = projects
        .iter()
        .map(Project::chain)
        .collect::<Result<Vec<_>, _>>()?;
    merge(chains)
}

/// Merge revision chains into a timeline.
///
/// While any chain has revisions left, the pivot is the chain whose current
/// head is the most recent among the chains that are not exhausted. A line of
/// every chain's current head is emitted, then the pivot chain advances.
/// Exhausted chains keep contributing their last revision. Equal timestamps
/// are broken by project name, smallest first.
///
/// # Errors
///
/// Rejects an empty input, duplicate project names, and any empty chain.
pub fn merge(mut chains: Vec<RevisionChain>) -> Result<Timeline, HistoryError> {
    if chains.is_empty() {
        return Err(HistoryError::NoProjects);
    }

    chains.sort_by(|a, b| a.project().cmp(b.project()));

    if let Some(pair) = chains
        .windows(2)
        .find(|pair| pair[0].project() == pair[1].project())
    {
        return Err(HistoryError::DuplicateProject(pair[0].project().to_string()));
    }

    if let Some(empty) = chains.iter().find(|chain| chain.is_empty()) {
        return Err(HistoryError::EmptyRange {
            project: empty.project().to_string(),
        });
    }

    let projects: Vec<String> = chains.iter().map(|c| c.project().to_string()).collect();
    let mut lines = Vec::with_capacity(chains.iter().map(RevisionChain::len).sum());

    while let Some(pivot) = select_pivot(&chains) {
        let line = Line {
            revisions: chains
                .iter()
                .filter_map(RevisionChain::head)
                .cloned()
                .collect(),
        };
        debug!("Generated a line of history: {}", line);
        lines.push(line);

        if !chains[pivot].advance() {
            debug!("Exhausted {}", chains[pivot].project());
        }
    }

    debug!("Merged {} projects into {} lines", projects.len(), lines.len());
    Ok(Timeline { projects, lines })
}

/// Index of the non-exhausted chain with the most recent head.
///
/// `chains` is sorted by project name, so keeping the first of equal
/// timestamps breaks ties by name.
fn select_pivot(chains: &[RevisionChain]) -> Option<usize> {
    let mut pivot: Option<(usize, &Revision)> = None;

    for (index, chain) in chains.iter().enumerate() {
        if chain.is_exhausted() {
            continue;
        }
        let Some(head) = chain.head() else {
            continue;
        };
        match pivot {
            Some((_, best)) if head.timestamp() <= best.timestamp() => {}
            _ => pivot = Some((index, head)),
        }
    }

    pivot.map(|(index, _)| index)
}
