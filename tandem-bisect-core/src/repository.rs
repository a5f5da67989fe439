//! The repository contract the core depends on, and projects bound to it.
//!
//! Concrete adapters (git, Mercurial) live in the `tandem-bisect` crate. The
//! core only needs to list the revisions of a range and to check one out.

use std::fmt;

use chrono::{DateTime, FixedOffset};
use thiserror::Error;

use crate::history::HistoryError;
use crate::revision::{Revision, TimestampError};

/// Errors raised by a repository adapter.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The VCS program could not be started.
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The VCS program ran but reported failure.
    #[error("{command} failed: {stderr}")]
    Command { command: String, stderr: String },

    /// A listed revision carried a timestamp that could not be parsed.
    #[error(transparent)]
    Timestamp(#[from] TimestampError),

    /// A line of revision-listing output did not have the expected shape.
    #[error("Malformed revision listing entry: {0}")]
    MalformedListing(String),

    /// The repository could not be cloned into its local path.
    #[error("Failed to clone {url}: {reason}")]
    Clone { url: String, reason: String },
}

/// A revision as reported by an adapter, before it is attached to a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedRevision {
    pub id: String,
    pub timestamp: DateTime<FixedOffset>,
}

impl ListedRevision {
    pub fn new(id: impl Into<String>, timestamp: DateTime<FixedOffset>) -> Self {
        Self {
            id: id.into(),
            timestamp,
        }
    }
}

/// Capabilities the core needs from a version-control backend.
pub trait Repository: Send + Sync {
    /// List the revisions strictly after `from` up to and including `to`,
    /// oldest first.
    fn list_revisions(&self, from: &str, to: &str)
        -> Result<Vec<ListedRevision>, RepositoryError>;

    /// Discard local modifications and make the working copy reflect `id`.
    fn checkout(&self, id: &str) -> Result<(), RepositoryError>;

    /// A human-friendly name (usually a tag) for `id`, if there is one.
    fn describe(&self, _id: &str) -> Result<Option<String>, RepositoryError> {
        Ok(None)
    }
}

/// A named repository with its known-good and known-bad boundary.
pub struct Project {
    name: String,
    good: String,
    bad: String,
    repository: Box<dyn Repository>,
}

impl Project {
    pub fn new(
        name: impl Into<String>,
        good: impl Into<String>,
        bad: impl Into<String>,
        repository: Box<dyn Repository>,
    ) -> Self {
        Self {
            name: name.into(),
            good: good.into(),
            bad: bad.into(),
            repository,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn good(&self) -> &str {
        &self.good
    }

    pub fn bad(&self) -> &str {
        &self.bad
    }

    /// Build this project's revision chain from `good` (exclusive) to `bad`
    /// (inclusive).
    ///
    /// # Errors
    ///
    /// Fails if the adapter cannot list the range, or if the range is empty.
    pub fn chain(&self) -> Result<RevisionChain, HistoryError> {
        let listed = self
            .repository
            .list_revisions(&self.good, &self.bad)
            .map_err(|source| HistoryError::Listing {
                project: self.name.clone(),
                source,
            })?;

        let chain = RevisionChain::new(self.name.clone(), listed);
        if chain.is_empty() {
            return Err(HistoryError::EmptyRange {
                project: self.name.clone(),
            });
        }

        tracing::debug!("{} has {} revisions in range", self.name, chain.len());
        Ok(chain)
    }

    /// Check out one of this project's revisions.
    pub fn checkout(&self, revision: &Revision) -> Result<(), RepositoryError> {
        tracing::debug!("Setting revision for {}", revision);
        self.repository.checkout(revision.id())
    }

    /// Look up a tag or other friendly name for a revision.
    pub fn describe(&self, revision: &Revision) -> Result<Option<String>, RepositoryError> {
        self.repository.describe(revision.id())
    }
}

impl fmt::Debug for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Project")
            .field("name", &self.name)
            .field("good", &self.good)
            .field("bad", &self.bad)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}..{})", self.name, self.good, self.bad)
    }
}

/// One project's revisions, oldest first, with a forward-only cursor.
///
/// Once the last revision has been advanced past, the chain is exhausted but
/// keeps reporting that revision as its head.
#[derive(Debug, Clone)]
pub struct RevisionChain {
    project: String,
    revisions: Vec<Revision>,
    cursor: usize,
    exhausted: bool,
}

impl RevisionChain {
    pub fn new(project: impl Into<String>, listed: impl IntoIterator<Item = ListedRevision>) -> Self {
        let project = project.into();
        let revisions = listed
            .into_iter()
            .map(|rev| Revision::new(rev.id, project.clone(), rev.timestamp))
            .collect();
        Self {
            project,
            revisions,
            cursor: 0,
            exhausted: false,
        }
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn len(&self) -> usize {
        self.revisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.revisions.is_empty()
    }

    /// The current head, or `None` for an empty chain.
    pub fn head(&self) -> Option<&Revision> {
        self.revisions.get(self.cursor)
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted || self.revisions.is_empty()
    }

    /// Move to the next revision. Returns `false` once the chain is exhausted.
    pub fn advance(&mut self) -> bool {
        if self.cursor + 1 < self.revisions.len() {
            self.cursor += 1;
            true
        } else {
            self.exhausted = true;
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::revision::parse_timestamp;
    use std::sync::{Arc, Mutex};

    struct FixedRepository {
        listing: Vec<ListedRevision>,
        checkouts: Arc<Mutex<Vec<String>>>,
    }

    impl Repository for FixedRepository {
        fn list_revisions(
            &self,
            _from: &str,
            _to: &str,
        ) -> Result<Vec<ListedRevision>, RepositoryError> {
            Ok(self.listing.clone())
        }

        fn checkout(&self, id: &str) -> Result<(), RepositoryError> {
            self.checkouts.lock().unwrap().push(id.to_string());
            Ok(())
        }
    }

    fn listed(id: &str, ts: &str) -> ListedRevision {
        ListedRevision::new(id, parse_timestamp(ts).unwrap())
    }

    #[test]
    fn test_chain_advances_to_exhaustion() {
        let mut chain = RevisionChain::new(
            "gaia",
            vec![
                listed("a", "2013-01-01 00:00:00 +0000"),
                listed("b", "2013-01-02 00:00:00 +0000"),
            ],
        );

        assert_eq!(chain.len(), 2);
        assert_eq!(chain.head().unwrap().id(), "a");
        assert!(!chain.is_exhausted());

        assert!(chain.advance());
        assert_eq!(chain.head().unwrap().id(), "b");
        assert!(!chain.is_exhausted());

        assert!(!chain.advance());
        assert!(chain.is_exhausted());
        // The last head is kept after exhaustion
        assert_eq!(chain.head().unwrap().id(), "b");
    }

    #[test]
    fn test_chain_revisions_belong_to_project() {
        let chain = RevisionChain::new("gecko", vec![listed("a", "2013-01-01 00:00:00 +0000")]);
        assert_eq!(chain.head().unwrap().project(), "gecko");
    }

    #[test]
    fn test_empty_chain_is_exhausted() {
        let chain = RevisionChain::new("gaia", Vec::new());
        assert!(chain.is_empty());
        assert!(chain.is_exhausted());
        assert!(chain.head().is_none());
    }

    #[test]
    fn test_project_chain_rejects_empty_range() {
        let project = Project::new(
            "gaia",
            "abc",
            "abc",
            Box::new(FixedRepository {
                listing: Vec::new(),
                checkouts: Arc::default(),
            }),
        );

        match project.chain() {
            Err(HistoryError::EmptyRange { project }) => assert_eq!(project, "gaia"),
            other => panic!("Expected EmptyRange, got {:?}", other),
        }
    }

    #[test]
    fn test_project_checkout_uses_revision_id() {
        let checkouts = Arc::new(Mutex::new(Vec::new()));
        let project = Project::new(
            "gaia",
            "good",
            "bad",
            Box::new(FixedRepository {
                listing: vec![listed("a", "2013-01-01 00:00:00 +0000")],
                checkouts: Arc::clone(&checkouts),
            }),
        );

        let chain = project.chain().unwrap();
        project.checkout(chain.head().unwrap()).unwrap();

        assert_eq!(*checkouts.lock().unwrap(), vec!["a".to_string()]);
        assert_eq!(project.describe(chain.head().unwrap()).unwrap(), None);
        assert_eq!(project.to_string(), "gaia (good..bad)");
    }
}
