use std::collections::BTreeSet;
use std::io::{self, Write};

use chrono::TimeDelta;
use colored::Colorize;

use super::{ReportError, Reporter};
use crate::bisection::{BisectionReport, BisectionState, LineStatus, Outcome};
use crate::history::{Line, Timeline};

/// Width of the revision identifier column.
const ID_WIDTH: usize = 12;

/// Width of an RFC 3339 timestamp with offset.
const DATE_WIDTH: usize = 25;

/// A reporter that prints the timeline and the search trail to the terminal.
#[derive(Debug, Clone, Default)]
pub struct TerminalReporter {
    /// Whether to use colors in output (defaults to true).
    use_colors: bool,
}

impl TerminalReporter {
    /// Create a new terminal reporter with default settings.
    pub fn new() -> Self {
        Self { use_colors: true }
    }

    /// Create a terminal reporter with color output disabled.
    pub fn without_colors() -> Self {
        Self { use_colors: false }
    }

    /// Shorten a revision identifier to the column width.
    fn short_id(id: &str) -> &str {
        match id.char_indices().nth(ID_WIDTH) {
            Some((end, _)) => &id[..end],
            None => id,
        }
    }

    /// Format a time span as days, hours and minutes.
    fn format_span(span: TimeDelta) -> String {
        let minutes = span.num_minutes().abs();
        let (days, hours, minutes) = (minutes / 1440, (minutes / 60) % 24, minutes % 60);
        if days > 0 {
            format!("{}d {}h {}m", days, hours, minutes)
        } else if hours > 0 {
            format!("{}h {}m", hours, minutes)
        } else {
            format!("{}m", minutes)
        }
    }

    /// Format the line-number cell: 1-based index, plus test order when tested.
    fn format_number(index: usize, state: &BisectionState) -> String {
        match state.order_of(index) {
            Some(position) => format!("{} ({})", index + 1, position + 1),
            None => format!("{}", index + 1),
        }
    }

    fn paint(&self, text: String, status: LineStatus) -> String {
        if !self.use_colors {
            return text;
        }
        match status {
            LineStatus::Found => text.blue().bold().to_string(),
            LineStatus::Passed => text.green().to_string(),
            LineStatus::Failed => text.red().to_string(),
            LineStatus::Untested => text.dimmed().to_string(),
        }
    }

    /// Print the table header.
    fn print_header(&self, writer: &mut impl Write, timeline: &Timeline) -> io::Result<()> {
        writeln!(writer)?;
        let mut header = format!("{:<10}", "Line");
        for project in timeline.projects() {
            header.push_str(&format!(
                " {:<id$} {:<date$}",
                format!("{} rev", project),
                format!("{} date", project),
                id = ID_WIDTH,
                date = DATE_WIDTH,
            ));
        }
        let width = header.len();
        if self.use_colors {
            writeln!(writer, "{}", header.bold())?;
        } else {
            writeln!(writer, "{}", header)?;
        }
        writeln!(writer, "{}", "-".repeat(width))?;
        Ok(())
    }

    /// Print a single timeline row.
    fn print_row(
        &self,
        writer: &mut impl Write,
        index: usize,
        line: &Line,
        state: &BisectionState,
    ) -> io::Result<()> {
        let mut row = format!("{:<10}", Self::format_number(index, state));
        for rev in line {
            row.push_str(&format!(
                " {:<id$} {:<date$}",
                Self::short_id(rev.id()),
                rev.timestamp().to_rfc3339(),
                id = ID_WIDTH,
                date = DATE_WIDTH,
            ));
        }
        writeln!(writer, "{}", self.paint(row, state.status(index)))?;
        Ok(())
    }

    /// Print the summary footer.
    fn print_summary(
        &self,
        writer: &mut impl Write,
        timeline: &Timeline,
        result: &BisectionReport,
    ) -> io::Result<()> {
        writeln!(writer)?;

        let summary_label = "Summary:";
        if self.use_colors {
            writeln!(writer, "{} {} lines", summary_label.bold(), timeline.len())?;
        } else {
            writeln!(writer, "{} {} lines", summary_label, timeline.len())?;
        }

        for project in timeline.projects() {
            let revisions: Vec<_> = timeline
                .iter()
                .filter_map(|line| line.get(project))
                .collect();
            let distinct: BTreeSet<&str> = revisions.iter().map(|rev| rev.id()).collect();
            let oldest = revisions.iter().map(|rev| rev.timestamp()).min();
            let newest = revisions.iter().map(|rev| rev.timestamp()).max();
            let span = match (oldest, newest) {
                (Some(oldest), Some(newest)) => Self::format_span(newest - oldest),
                _ => Self::format_span(TimeDelta::zero()),
            };
            writeln!(
                writer,
                "  {}: {} commits over {}",
                project,
                distinct.len(),
                span
            )?;
        }

        let state = &result.state;
        let tested = format!(
            "{} tests run ({} passed, {} failed), {} expected",
            state.steps_taken(),
            state.passed.len(),
            state.failed.len(),
            state.expected_steps
        );
        writeln!(writer, "  {}", tested)?;

        match &result.outcome {
            Outcome::Found { index, line } => {
                let index = *index;
                // The line after the found one is bad only if a test said so
                let next_failed = timeline
                    .get(index + 1)
                    .filter(|_| state.failed.contains(&(index + 1)));

                if state.passed.contains(&index) {
                    let text = format!("Last good line: {} ({})", index + 1, line);
                    writeln!(writer, "{}", self.paint(text, LineStatus::Found))?;
                    match next_failed {
                        Some(next) => writeln!(writer, "First bad line: {} ({})", index + 2, next)?,
                        None => writeln!(writer, "No failing line was found")?,
                    }
                } else if let Some(next) = next_failed {
                    let text = "No tested line passed";
                    writeln!(writer, "{}", self.paint(text.to_string(), LineStatus::Failed))?;
                    writeln!(
                        writer,
                        "First bad line: {} ({}) or {} ({})",
                        index + 1,
                        line,
                        index + 2,
                        next
                    )?;
                } else {
                    writeln!(writer, "Only line: {} ({}), nothing to test", index + 1, line)?;
                }
            }
            Outcome::Aborted => {
                let text = "Bisection aborted before a line was found";
                if self.use_colors {
                    writeln!(writer, "{}", text.yellow())?;
                } else {
                    writeln!(writer, "{}", text)?;
                }
            }
        }

        writeln!(writer)?;
        Ok(())
    }
}

impl Reporter for TerminalReporter {
    fn report(&self, timeline: &Timeline, result: &BisectionReport) -> Result<(), ReportError> {
        let stdout = io::stdout();
        let mut writer = stdout.lock();

        self.print_header(&mut writer, timeline)?;

        for (index, line) in timeline.iter().enumerate() {
            self.print_row(&mut writer, index, line, &result.state)?;
        }

        self.print_summary(&mut writer, timeline, result)?;

        Ok(())
    }
}
