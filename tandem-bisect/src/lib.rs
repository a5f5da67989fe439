//! tandem-bisect: bisect several repositories together
//!
//! This library merges the histories of multiple repositories into one
//! chronological timeline and binary-searches it for the last line where an
//! evaluator still passes.

pub mod cli;
pub mod config;
pub mod driver;
pub mod evaluator;
pub mod project_arg;
pub mod source;

// Re-export core types for convenience
pub use tandem_bisect_core::{
    BisectError, BisectionReport, BisectionState, Bisector, Evaluator, EvaluatorError, Line,
    Outcome, Project, Reporter, Repository, RepositoryError, Timeline, Verdict,
};

// Re-export main types from this crate
pub use cli::Cli;
pub use config::Config;
pub use evaluator::{InteractiveEvaluator, ScriptEvaluator, BAD_EXIT, GOOD_EXIT};
pub use project_arg::{ProjectArg, ProjectArgError};
pub use source::{
    open_repository, GitRepository, HgRepository, RepositoryKind, RepositoryOptions,
    UnsupportedVcs,
};
