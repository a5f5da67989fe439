//! Command-line interface for tandem-bisect.

use crate::config::Config;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "tandem-bisect")]
#[command(about = "Bisect several repositories together along one merged timeline")]
#[command(version)]
pub struct Cli {
    /// Projects to bisect, as [GIT|HG][URI->]LOCAL_PATH@GOOD..BAD
    #[arg(required = true, value_name = "PROJECT")]
    pub projects: Vec<String>,

    /// Shell command that judges a line (exit code 0 means good)
    #[arg(short, long, conflicts_with = "interactive")]
    pub script: Option<String>,

    /// Judge each line by hand in an interactive shell
    #[arg(short, long)]
    pub interactive: bool,

    /// Follow every merge parent when listing revisions
    #[arg(long)]
    pub follow_merges: bool,

    /// Directory that remote projects are cloned into
    #[arg(long)]
    pub repos_dir: Option<PathBuf>,

    /// Also write the result as JSON to this path
    #[arg(long)]
    pub json: Option<PathBuf>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Path to config file (defaults to .tandem-bisect.toml when present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Apply CLI overrides to the configuration.
    ///
    /// CLI arguments take precedence over config file values. Choosing an
    /// evaluator on the command line replaces the one from the file.
    pub fn apply_to_config(&self, config: &mut Config) {
        if let Some(script) = &self.script {
            config.evaluator.script = Some(script.clone());
            config.evaluator.interactive = false;
        }

        if self.interactive {
            config.evaluator.interactive = true;
            config.evaluator.script = None;
        }

        if self.follow_merges {
            config.history.follow_merges = true;
        }

        if let Some(dir) = &self.repos_dir {
            config.repos.dir = dir.clone();
        }

        if let Some(json) = &self.json {
            config.report.json_path = Some(json.clone());
        }

        if self.no_color {
            config.report.colors = false;
        }
    }
}
