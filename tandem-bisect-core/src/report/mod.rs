//! Rendering a finished (or aborted) bisection.

use thiserror::Error;

use crate::bisection::BisectionReport;
use crate::history::Timeline;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub trait Reporter: Send + Sync {
    fn report(&self, timeline: &Timeline, result: &BisectionReport) -> Result<(), ReportError>;
}

mod json;
mod terminal;
pub use json::JsonReporter;
pub use terminal::TerminalReporter;
