//! Binary search over a merged timeline.
//!
//! Lines run from the known-good end (index 0) to the known-bad end. A
//! [`Verdict::Pass`] means the line is still good, so the search converges on
//! the last passing line; the line after it is the first bad one.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::history::{Line, Timeline};
use crate::repository::{Project, RepositoryError};

/// The outcome of evaluating one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    /// The line is good.
    Pass,
    /// The line is bad.
    Fail,
    /// Stop the whole bisection without a verdict.
    Abort,
}

impl From<bool> for Verdict {
    fn from(passed: bool) -> Self {
        if passed {
            Verdict::Pass
        } else {
            Verdict::Fail
        }
    }
}

/// Errors raised while judging a line. These are never treated as a failure
/// verdict.
#[derive(Debug, Error)]
pub enum EvaluatorError {
    /// The evaluator process could not be started.
    #[error("Failed to start '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The evaluator finished in a way that is neither a verdict nor an abort.
    #[error("Unexpected exit status from '{command}': {status}")]
    UnexpectedExit { command: String, status: String },

    /// The configured evaluator command has no program to run.
    #[error("Evaluator command is empty")]
    EmptyCommand,

    /// IO error while preparing the evaluator.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Pluggable pass/fail judgment of a checked-out line.
pub trait Evaluator {
    fn evaluate(&mut self, line: &Line) -> Result<Verdict, EvaluatorError>;
}

impl<F> Evaluator for F
where
    F: FnMut(&Line) -> Result<Verdict, EvaluatorError>,
{
    fn evaluate(&mut self, line: &Line) -> Result<Verdict, EvaluatorError> {
        self(line)
    }
}

/// Errors that end a bisection run.
#[derive(Debug, Error)]
pub enum BisectError {
    /// There is nothing to search.
    #[error("Cannot bisect an empty timeline")]
    EmptyTimeline,

    /// The timeline names a project that was not supplied to the bisector.
    #[error("Project '{0}' is in the timeline but was not supplied")]
    UnknownProject(String),

    /// A revision could not be checked out; the working state is ambiguous.
    #[error("Failed to check out {project}@{revision}: {source}")]
    Checkout {
        project: String,
        revision: String,
        #[source]
        source: RepositoryError,
    },

    /// The evaluator failed on a line.
    #[error("Evaluator failed on line {index}: {source}")]
    Evaluator {
        index: usize,
        #[source]
        source: EvaluatorError,
    },
}

/// How a line fared during the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStatus {
    Found,
    Passed,
    Failed,
    Untested,
}

/// Bookkeeping of a bisection run, indexed by position in the timeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BisectionState {
    /// Inclusive lower bound of the remaining interval.
    pub lo: usize,
    /// Exclusive upper bound of the remaining interval.
    pub hi: usize,
    /// `ceil(log2(N))`, for progress reporting only.
    pub expected_steps: u32,
    /// Tested indices in the order they were visited. Ends with the found
    /// index when that line was never tested itself.
    pub order: Vec<usize>,
    pub passed: BTreeSet<usize>,
    pub failed: BTreeSet<usize>,
    pub found: Option<usize>,
}

impl BisectionState {
    fn new(len: usize) -> Self {
        Self {
            lo: 0,
            hi: len,
            expected_steps: expected_steps(len),
            ..Self::default()
        }
    }

    /// Number of lines the evaluator has judged.
    pub fn steps_taken(&self) -> usize {
        self.passed.len() + self.failed.len()
    }

    /// Position of `index` in the test order, if it was visited.
    pub fn order_of(&self, index: usize) -> Option<usize> {
        self.order.iter().position(|&i| i == index)
    }

    pub fn status(&self, index: usize) -> LineStatus {
        if self.found == Some(index) {
            LineStatus::Found
        } else if self.passed.contains(&index) {
            LineStatus::Passed
        } else if self.failed.contains(&index) {
            LineStatus::Failed
        } else {
            LineStatus::Untested
        }
    }
}

/// `ceil(log2(len))`, with zero for timelines of one line or fewer.
pub fn expected_steps(len: usize) -> u32 {
    if len <= 1 {
        0
    } else {
        usize::BITS - (len - 1).leading_zeros()
    }
}

/// How a bisection run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    /// The search converged on `line`, the last passing line.
    Found { index: usize, line: Line },
    /// The evaluator asked to stop.
    Aborted,
}

/// Result of a bisection run together with its audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BisectionReport {
    pub outcome: Outcome,
    pub state: BisectionState,
}

impl BisectionReport {
    pub fn found_index(&self) -> Option<usize> {
        match self.outcome {
            Outcome::Found { index, .. } => Some(index),
            Outcome::Aborted => None,
        }
    }

    pub fn found_line(&self) -> Option<&Line> {
        match &self.outcome {
            Outcome::Found { line, .. } => Some(line),
            Outcome::Aborted => None,
        }
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self.outcome, Outcome::Aborted)
    }
}

/// Binary search of a timeline, checking out each tested line across all
/// projects before handing it to an evaluator.
#[derive(Debug)]
pub struct Bisector<'a> {
    projects: &'a [Project],
    timeline: &'a Timeline,
}

impl<'a> Bisector<'a> {
    pub fn new(projects: &'a [Project], timeline: &'a Timeline) -> Self {
        Self { projects, timeline }
    }

    /// Run the search to completion, or until the evaluator aborts.
    ///
    /// Verdicts are assumed monotonic: passing up to some line and failing
    /// after it. Other verdict sequences still terminate, with a plausible
    /// but unverified answer.
    ///
    /// # Errors
    ///
    /// Any checkout or evaluator failure stops the run immediately. A line is
    /// never evaluated unless every project was checked out.
    pub fn run(&self, evaluator: &mut dyn Evaluator) -> Result<BisectionReport, BisectError> {
        if self.timeline.is_empty() {
            return Err(BisectError::EmptyTimeline);
        }
        if let Some(missing) = self
            .timeline
            .projects()
            .iter()
            .find(|name| self.project(name).is_none())
        {
            return Err(BisectError::UnknownProject(missing.clone()));
        }

        let lines = self.timeline.lines();
        let mut state = BisectionState::new(lines.len());
        info!(
            "Bisecting {} lines, about {} tests",
            lines.len(),
            state.expected_steps
        );

        while state.hi - state.lo > 1 {
            let mid = state.lo + (state.hi - state.lo) / 2;
            let line = &lines[mid];

            info!(
                "Running test {} of {}: line {}",
                state.steps_taken() + 1,
                state.expected_steps,
                mid + 1
            );
            for rev in line {
                info!("  * {}", rev);
            }

            self.checkout(line)?;

            let verdict = evaluator
                .evaluate(line)
                .map_err(|source| BisectError::Evaluator { index: mid, source })?;

            match verdict {
                Verdict::Pass => {
                    info!("Test passed");
                    state.order.push(mid);
                    state.passed.insert(mid);
                    state.lo = mid;
                }
                Verdict::Fail => {
                    info!("Test failed");
                    state.order.push(mid);
                    state.failed.insert(mid);
                    state.hi = mid;
                }
                Verdict::Abort => {
                    warn!(
                        "Bisection aborted after {} of {} tests",
                        state.steps_taken(),
                        state.expected_steps
                    );
                    return Ok(BisectionReport {
                        outcome: Outcome::Aborted,
                        state,
                    });
                }
            }
        }

        let found = state.lo;
        if !state.order.contains(&found) {
            state.order.push(found);
        }
        state.found = Some(found);

        if (state.steps_taken() as u32) < state.expected_steps {
            debug!("Converged one test early");
        }
        info!("Found line {}", found + 1);

        Ok(BisectionReport {
            outcome: Outcome::Found {
                index: found,
                line: lines[found].clone(),
            },
            state,
        })
    }

    fn project(&self, name: &str) -> Option<&'a Project> {
        self.projects.iter().find(|p| p.name() == name)
    }

    /// Check out every revision of `line`, stopping at the first failure.
    fn checkout(&self, line: &Line) -> Result<(), BisectError> {
        for rev in line {
            let project = self
                .project(rev.project())
                .ok_or_else(|| BisectError::UnknownProject(rev.project().to_string()))?;

            project
                .checkout(rev)
                .map_err(|source| BisectError::Checkout {
                    project: rev.project().to_string(),
                    revision: rev.id().to_string(),
                    source,
                })?;
        }
        Ok(())
    }
}
