use std::path::{Path, PathBuf};

use tandem_bisect_core::{parse_timestamp, ListedRevision, Repository, RepositoryError};

use super::{command, RepositoryOptions};

/// Separator between the hash and the commit date in the log format.
const LOG_SEPARATOR: &str = " --- ";

/// A repository adapter backed by a local git clone.
#[derive(Debug, Clone)]
pub struct GitRepository {
    /// The root directory of the clone.
    local_path: PathBuf,
    follow_merges: bool,
}

impl GitRepository {
    /// Use the clone at `local_path`.
    pub fn new(local_path: impl Into<PathBuf>, options: RepositoryOptions) -> Self {
        Self {
            local_path: local_path.into(),
            follow_merges: options.follow_merges,
        }
    }

    pub fn local_path(&self) -> &Path {
        &self.local_path
    }

    /// Run a git command in the clone.
    fn run_git_command(&self, args: &[&str]) -> Result<String, RepositoryError> {
        command::run("git", Some(&self.local_path), args)
    }

    /// The hash the working copy currently points at.
    pub fn head(&self) -> Result<String, RepositoryError> {
        self.run_git_command(&["rev-parse", "HEAD"])
    }

    fn log_args(&self, range: &str) -> Vec<String> {
        let mut args = vec!["log".to_string()];
        if !self.follow_merges {
            args.push("--first-parent".to_string());
        }
        args.extend([
            "--date-order".to_string(),
            "--reverse".to_string(),
            range.to_string(),
            format!("--pretty=format:%H{}%ci", LOG_SEPARATOR),
        ]);
        args
    }
}

/// Parse `git log` output of `<hash> --- <committer date>` lines.
fn parse_log(output: &str) -> Result<Vec<ListedRevision>, RepositoryError> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            let (id, date) = line
                .split_once(LOG_SEPARATOR)
                .ok_or_else(|| RepositoryError::MalformedListing(line.to_string()))?;
            Ok(ListedRevision::new(id.trim(), parse_timestamp(date.trim())?))
        })
        .collect()
}

impl Repository for GitRepository {
    fn list_revisions(
        &self,
        from: &str,
        to: &str,
    ) -> Result<Vec<ListedRevision>, RepositoryError> {
        let args = self.log_args(&format!("{}..{}", from, to));
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let output = self.run_git_command(&args)?;
        let revisions = parse_log(&output)?;
        tracing::debug!(
            "{} lists {} revisions in {}..{}",
            self.local_path.display(),
            revisions.len(),
            from,
            to
        );
        Ok(revisions)
    }

    fn checkout(&self, id: &str) -> Result<(), RepositoryError> {
        self.run_git_command(&["reset", "--hard", "HEAD"])?;
        self.run_git_command(&["checkout", "--quiet", id])?;
        Ok(())
    }

    fn describe(&self, id: &str) -> Result<Option<String>, RepositoryError> {
        let output = command::output(
            "git",
            Some(&self.local_path),
            &["describe", "--tags", "--exact-match", id],
        )?;
        if !output.status.success() {
            return Ok(None);
        }
        let tag = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok((!tag.is_empty()).then_some(tag))
    }
}
