//! Core of tandem-bisect: merging several repositories' histories into one
//! timeline and binary-searching it.
//!
//! This crate knows nothing about git or Mercurial. Adapters implement
//! [`Repository`], evaluators implement [`Evaluator`], and the
//! `tandem-bisect` crate wires them to the command line.

pub mod bisection;
pub mod history;
pub mod report;
pub mod repository;
pub mod revision;

// Re-export main types for convenience
pub use bisection::{
    expected_steps, BisectError, BisectionReport, BisectionState, Bisector, Evaluator,
    EvaluatorError, LineStatus, Outcome, Verdict,
};
pub use history::{build_timeline, merge, HistoryError, Line, Timeline};
pub use report::{JsonReporter, ReportError, Reporter, TerminalReporter};
pub use repository::{ListedRevision, Project, Repository, RepositoryError, RevisionChain};
pub use revision::{parse_timestamp, Revision, TimestampError};
