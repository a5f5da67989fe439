use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::{ReportError, Reporter};
use crate::bisection::BisectionReport;
use crate::history::Timeline;

/// The document written by [`JsonReporter`].
#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    timeline: &'a Timeline,
    bisection: &'a BisectionReport,
}

/// Writes the timeline and bisection trail to a JSON file.
#[derive(Debug, Clone)]
pub struct JsonReporter {
    path: PathBuf,
}

impl JsonReporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Reporter for JsonReporter {
    fn report(&self, timeline: &Timeline, result: &BisectionReport) -> Result<(), ReportError> {
        let file = File::create(&self.path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(
            &mut writer,
            &JsonReport {
                timeline,
                bisection: result,
            },
        )?;
        writer.flush()?;
        tracing::debug!("Wrote JSON report to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bisection::{BisectionState, Outcome};
    use crate::history::merge;
    use crate::repository::{ListedRevision, RevisionChain};
    use crate::revision::parse_timestamp;
    use tempfile::TempDir;

    #[test]
    fn test_writes_found_index_and_trail() {
        let timeline = merge(vec![RevisionChain::new(
            "gaia",
            ["2013-01-01 00:00:00 -0800", "2013-01-02 00:00:00 -0800"]
                .iter()
                .enumerate()
                .map(|(i, ts)| ListedRevision::new(format!("r{}", i), parse_timestamp(ts).unwrap())),
        )])
        .unwrap();

        let mut state = BisectionState {
            lo: 1,
            hi: 2,
            expected_steps: 1,
            order: vec![1],
            found: Some(1),
            ..BisectionState::default()
        };
        state.passed.insert(1);
        let result = BisectionReport {
            outcome: Outcome::Found {
                index: 1,
                line: timeline.lines()[1].clone(),
            },
            state,
        };

        let dir = TempDir::new().unwrap();
        let reporter = JsonReporter::new(dir.path().join("bisect.json"));
        reporter.report(&timeline, &result).unwrap();

        let raw = std::fs::read_to_string(reporter.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();

        assert_eq!(value["bisection"]["outcome"]["kind"], "found");
        assert_eq!(value["bisection"]["outcome"]["index"], 1);
        assert_eq!(value["bisection"]["state"]["order"], serde_json::json!([1]));
        assert_eq!(value["bisection"]["state"]["passed"], serde_json::json!([1]));
        assert_eq!(value["timeline"]["projects"], serde_json::json!(["gaia"]));
        assert_eq!(
            value["timeline"]["lines"][0]["revisions"][0]["timestamp"],
            "2013-01-01T00:00:00-08:00"
        );

        // The document deserializes back into the same report
        let parsed: BisectionReport =
            serde_json::from_value(value["bisection"].clone()).unwrap();
        assert_eq!(parsed, result);
    }

    #[test]
    fn test_unwritable_path_is_an_io_error() {
        let reporter = JsonReporter::new("/nonexistent/dir/bisect.json");
        let result = BisectionReport {
            outcome: Outcome::Aborted,
            state: BisectionState::default(),
        };
        let err = reporter.report(&Timeline::default(), &result).unwrap_err();
        assert!(matches!(err, ReportError::Io(_)));
    }
}
