//! Wires projects, evaluator and reporters together for one bisection run.

use std::path::Path;

use anyhow::{bail, Context, Result};
use tandem_bisect_core::{
    build_timeline, BisectionReport, Bisector, Evaluator, JsonReporter, Line, Project, Reporter,
    TerminalReporter, Timeline,
};

use crate::config::{Config, EvaluatorConfig, HistoryConfig, ReportConfig};
use crate::evaluator::{InteractiveEvaluator, ScriptEvaluator};
use crate::project_arg::ProjectArg;
use crate::source::{open_repository, RepositoryOptions};

/// Parse every project argument, placing remote clones under `repos_dir`.
pub fn parse_projects(args: &[String], repos_dir: &Path) -> Result<Vec<ProjectArg>> {
    args.iter()
        .map(|arg| ProjectArg::parse(arg, repos_dir).map_err(anyhow::Error::from))
        .collect()
}

/// Open (cloning when needed) the repository of every project.
pub fn open_projects(args: &[ProjectArg], history: &HistoryConfig) -> Result<Vec<Project>> {
    let options = RepositoryOptions {
        follow_merges: history.follow_merges,
    };

    args.iter()
        .map(|arg| -> Result<Project> {
            let repository = open_repository(arg.vcs(), arg.uri(), arg.local_path(), options)
                .with_context(|| format!("Failed to set up project {}", arg.name()))?;
            tracing::debug!("Using {} for {}", arg.vcs(), arg.name());
            Ok(Project::new(arg.name(), arg.good(), arg.bad(), repository))
        })
        .collect()
}

/// Build the evaluator selected by the configuration.
pub fn build_evaluator(config: &EvaluatorConfig) -> Result<Box<dyn Evaluator>> {
    if config.interactive && config.script.is_some() {
        bail!("Both a script and the interactive evaluator are configured, choose one");
    }

    if config.interactive {
        let shell = config
            .shell
            .clone()
            .unwrap_or_else(InteractiveEvaluator::default_shell);
        let evaluator = InteractiveEvaluator::new(&shell)
            .with_context(|| format!("Invalid interactive shell '{}'", shell))?;
        return Ok(Box::new(evaluator));
    }

    match &config.script {
        Some(script) if script.trim().is_empty() => bail!("The evaluator script is empty"),
        Some(script) => Ok(Box::new(ScriptEvaluator::new(
            script.clone(),
            config.workdir.clone(),
        ))),
        None => bail!("No evaluator configured, pass --script or --interactive"),
    }
}

/// The reporters selected by the configuration.
pub fn reporters(config: &ReportConfig) -> Vec<Box<dyn Reporter>> {
    let terminal = if config.colors {
        TerminalReporter::new()
    } else {
        TerminalReporter::without_colors()
    };

    let mut reporters: Vec<Box<dyn Reporter>> = vec![Box::new(terminal)];
    if let Some(path) = &config.json_path {
        reporters.push(Box::new(JsonReporter::new(path)));
    }
    reporters
}

/// Merge the histories of `projects` and bisect the resulting timeline.
pub fn bisect(
    projects: &[Project],
    evaluator: &mut dyn Evaluator,
) -> Result<(Timeline, BisectionReport)> {
    let timeline = build_timeline(projects).context("Failed to build the merged history")?;
    tracing::info!(
        "Merged {} projects into {} lines",
        timeline.projects().len(),
        timeline.len()
    );

    let report = Bisector::new(projects, &timeline)
        .run(evaluator)
        .context("Bisection failed")?;

    if let Some(line) = report.found_line() {
        describe_line(projects, line);
    }

    Ok((timeline, report))
}

/// Log any tags naming the revisions of `line`.
fn describe_line(projects: &[Project], line: &Line) {
    for rev in line {
        let Some(project) = projects.iter().find(|p| p.name() == rev.project()) else {
            continue;
        };
        match project.describe(rev) {
            Ok(Some(tag)) => tracing::info!("  {} is tagged {}", rev, tag),
            Ok(None) => {}
            Err(e) => tracing::debug!("Could not describe {}: {}", rev, e),
        }
    }
}

/// Run a whole bisection from a loaded configuration and the raw project
/// arguments.
pub fn run(config: &Config, project_args: &[String]) -> Result<BisectionReport> {
    let args = parse_projects(project_args, &config.repos.dir)?;
    let mut evaluator = build_evaluator(&config.evaluator)?;
    let projects = open_projects(&args, &config.history)?;

    let (timeline, report) = bisect(&projects, evaluator.as_mut())?;

    for reporter in reporters(&config.report) {
        reporter
            .report(&timeline, &report)
            .context("Failed to report results")?;
    }

    Ok(report)
}
