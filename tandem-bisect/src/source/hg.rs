use std::path::{Path, PathBuf};

use tandem_bisect_core::{parse_timestamp, ListedRevision, Repository, RepositoryError};

use super::{command, RepositoryOptions};

const LOG_TEMPLATE: &str = "{node} {date|rfc3339date}\n";

/// A repository adapter backed by a local Mercurial clone.
#[derive(Debug, Clone)]
pub struct HgRepository {
    local_path: PathBuf,
    follow_merges: bool,
}

impl HgRepository {
    pub fn new(local_path: impl Into<PathBuf>, options: RepositoryOptions) -> Self {
        Self {
            local_path: local_path.into(),
            follow_merges: options.follow_merges,
        }
    }

    pub fn local_path(&self) -> &Path {
        &self.local_path
    }

    fn run_hg_command(&self, args: &[&str]) -> Result<String, RepositoryError> {
        command::run("hg", Some(&self.local_path), args)
    }

    /// Revset selecting everything after `from` up to `to`, oldest first.
    fn revset(&self, from: &str, to: &str) -> String {
        let range = format!("({}::{}) - {}", from, to, from);
        if self.follow_merges {
            format!("sort({}, date)", range)
        } else {
            format!("sort(_firstancestors({}) and ({}), date)", to, range)
        }
    }
}

/// Parse `<node> <rfc3339 date>` lines.
fn parse_log(output: &str) -> Result<Vec<ListedRevision>, RepositoryError> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            let (id, date) = line
                .split_once(' ')
                .ok_or_else(|| RepositoryError::MalformedListing(line.to_string()))?;
            Ok(ListedRevision::new(id, parse_timestamp(date.trim())?))
        })
        .collect()
}

/// The first tag other than the moving `tip` tag.
fn first_tag(tags: &str) -> Option<String> {
    tags.split_whitespace()
        .find(|tag| *tag != "tip")
        .map(str::to_string)
}

impl Repository for HgRepository {
    fn list_revisions(
        &self,
        from: &str,
        to: &str,
    ) -> Result<Vec<ListedRevision>, RepositoryError> {
        let revset = self.revset(from, to);
        let output = self.run_hg_command(&["log", "-r", &revset, "--template", LOG_TEMPLATE])?;
        let revisions = parse_log(&output)?;
        tracing::debug!(
            "{} lists {} revisions for {}",
            self.local_path.display(),
            revisions.len(),
            revset
        );
        Ok(revisions)
    }

    fn checkout(&self, id: &str) -> Result<(), RepositoryError> {
        self.run_hg_command(&["update", "--clean", "--rev", id])?;
        Ok(())
    }

    fn describe(&self, id: &str) -> Result<Option<String>, RepositoryError> {
        let tags = self.run_hg_command(&["log", "-r", id, "--template", "{tags}"])?;
        Ok(first_tag(&tags))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revset_first_parent_by_default() {
        let repo = HgRepository::new("/tmp/gecko", RepositoryOptions::default());
        assert_eq!(
            repo.revset("aaa", "bbb"),
            "sort(_firstancestors(bbb) and ((aaa::bbb) - aaa), date)"
        );
    }

    #[test]
    fn test_revset_follow_merges() {
        let repo = HgRepository::new(
            "/tmp/gecko",
            RepositoryOptions {
                follow_merges: true,
            },
        );
        assert_eq!(repo.revset("aaa", "bbb"), "sort((aaa::bbb) - aaa, date)");
    }

    #[test]
    fn test_parse_log() {
        let output = "0123abcd 2013-01-29T16:06:52-08:00\n4567ef01 2013-01-30T09:00:00+09:00\n";
        let revisions = parse_log(output).unwrap();
        assert_eq!(revisions.len(), 2);
        assert_eq!(revisions[0].id, "0123abcd");
        assert_eq!(revisions[1].timestamp.to_rfc3339(), "2013-01-30T09:00:00+09:00");
    }

    #[test]
    fn test_parse_log_malformed() {
        let err = parse_log("0123abcd").unwrap_err();
        assert!(matches!(err, RepositoryError::MalformedListing(_)));
    }

    #[test]
    fn test_first_tag_skips_tip() {
        assert_eq!(first_tag("tip v1.0"), Some("v1.0".to_string()));
        assert_eq!(first_tag("tip"), None);
        assert_eq!(first_tag(""), None);
    }
}
