//! Parsing of `[GIT|HG][URI->]LOCAL_PATH@GOOD..BAD` project arguments.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::source::RepositoryKind;

/// Hosts that only serve git repositories.
const GIT_HOSTS: &[&str] = &[
    "github.com",
    "codeaurora.org",
    "linaro.org",
    "git.mozilla.org",
];

/// Hosts that only serve Mercurial repositories.
const HG_HOSTS: &[&str] = &["hg.mozilla.org"];

/// Errors from parsing a project argument.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProjectArgError {
    #[error("Argument '{0}' is not properly formed, expected [GIT|HG][URI->]LOCAL_PATH@GOOD..BAD")]
    Malformed(String),

    #[error("Could not determine the VCS for '{0}', prefix it with GIT or HG")]
    AmbiguousVcs(String),

    #[error("Conflicting VCS clues in '{0}'")]
    ConflictingVcs(String),
}

/// One repository to bisect, as given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectArg {
    vcs: RepositoryKind,
    uri: Option<String>,
    local_path: PathBuf,
    name: String,
    good: String,
    bad: String,
}

impl ProjectArg {
    /// Parse a project argument. Remote URIs without an explicit local path
    /// are placed under `repos_dir`.
    pub fn parse(arg: &str, repos_dir: &Path) -> Result<Self, ProjectArgError> {
        let malformed = || ProjectArgError::Malformed(arg.to_string());

        let (prefix, rest) = if let Some(rest) = arg.strip_prefix("GIT") {
            (Some(RepositoryKind::Git), rest)
        } else if let Some(rest) = arg.strip_prefix("HG") {
            (Some(RepositoryKind::Hg), rest)
        } else {
            (None, arg)
        };

        let (location, range) = rest.rsplit_once('@').ok_or_else(malformed)?;
        let (good, bad) = range.split_once("..").ok_or_else(malformed)?;
        if location.is_empty() || good.is_empty() || bad.is_empty() {
            return Err(malformed());
        }

        let (uri, local_path) = match location.split_once("->") {
            Some((uri, local)) => {
                if uri.is_empty() || local.is_empty() {
                    return Err(malformed());
                }
                (Some(uri.to_string()), PathBuf::from(local))
            }
            None if !Path::new(location).exists() && looks_remote(location) => {
                let name = uri_to_name(location);
                if name.is_empty() {
                    return Err(malformed());
                }
                (Some(location.to_string()), repos_dir.join(name))
            }
            None => (None, PathBuf::from(location)),
        };

        let name = local_path_to_name(&local_path);
        if name.is_empty() {
            return Err(malformed());
        }

        let clue = match &uri {
            Some(uri) => vcs_clue(uri, arg)?,
            None => None,
        };

        let vcs = match (prefix, clue) {
            (Some(fixed), Some(guessed)) if fixed != guessed => {
                return Err(ProjectArgError::ConflictingVcs(arg.to_string()))
            }
            (Some(fixed), _) => fixed,
            (None, Some(guessed)) => guessed,
            (None, None) if uri.is_none() => detect_local(&local_path)
                .ok_or_else(|| ProjectArgError::AmbiguousVcs(arg.to_string()))?,
            (None, None) => return Err(ProjectArgError::AmbiguousVcs(arg.to_string())),
        };

        Ok(Self {
            vcs,
            uri,
            local_path,
            name,
            good: good.to_string(),
            bad: bad.to_string(),
        })
    }

    pub fn vcs(&self) -> RepositoryKind {
        self.vcs
    }

    /// Where to clone from, when the project is not only a local path.
    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }

    pub fn local_path(&self) -> &Path {
        &self.local_path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn good(&self) -> &str {
        &self.good
    }

    pub fn bad(&self) -> &str {
        &self.bad
    }
}

impl fmt::Display for ProjectArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.vcs {
            RepositoryKind::Git => "GIT",
            RepositoryKind::Hg => "HG",
        };
        write!(f, "{}", prefix)?;
        if let Some(uri) = &self.uri {
            write!(f, "{}->", uri)?;
        }
        write!(
            f,
            "{}@{}..{}",
            self.local_path.display(),
            self.good,
            self.bad
        )
    }
}

/// Whether `location` names a remote repository rather than a local path.
fn looks_remote(location: &str) -> bool {
    if location.contains("://") {
        return true;
    }
    // scp-like `host:path`; single-letter hosts are drive letters
    match location.split_once(':') {
        Some((host, path)) => host.len() > 1 && !host.contains('/') && !path.is_empty(),
        None => false,
    }
}

/// The repository name at the end of a URI, without any `.git` suffix.
pub fn uri_to_name(uri: &str) -> String {
    let without_scheme = uri.split_once("://").map_or(uri, |(_, rest)| rest);
    let trimmed = without_scheme.trim_end_matches('/');
    let last = trimmed
        .rsplit(|c: char| c == '/' || c == ':')
        .next()
        .unwrap_or(trimmed);
    last.strip_suffix(".git").unwrap_or(last).to_string()
}

/// The project name for a local path: its last component, without `.git`.
pub fn local_path_to_name(path: &Path) -> String {
    let last = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    match last.strip_suffix(".git") {
        Some(stripped) => stripped.to_string(),
        None => last,
    }
}

/// Guess the VCS from clues in a URI, failing when the clues contradict.
fn vcs_clue(uri: &str, arg: &str) -> Result<Option<RepositoryKind>, ProjectArgError> {
    let git = uri.starts_with("git://")
        || uri.ends_with(".git")
        || GIT_HOSTS.iter().any(|host| uri.contains(host));
    let hg = HG_HOSTS.iter().any(|host| uri.contains(host));

    match (git, hg) {
        (true, true) => Err(ProjectArgError::ConflictingVcs(arg.to_string())),
        (true, false) => Ok(Some(RepositoryKind::Git)),
        (false, true) => Ok(Some(RepositoryKind::Hg)),
        (false, false) => Ok(None),
    }
}

/// Identify an existing local clone by its metadata directory.
fn detect_local(path: &Path) -> Option<RepositoryKind> {
    if path.join(".git").exists() {
        Some(RepositoryKind::Git)
    } else if path.join(".hg").is_dir() {
        Some(RepositoryKind::Hg)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn repos() -> PathBuf {
        PathBuf::from("/work/repos")
    }

    #[test]
    fn test_local_path_to_name() {
        assert_eq!(local_path_to_name(Path::new("/work/test_file_name")), "test_file_name");
        assert_eq!(local_path_to_name(Path::new("/work/test_file_name.git")), "test_file_name");
        assert_eq!(local_path_to_name(Path::new("gaia/")), "gaia");
    }

    #[test]
    fn test_uri_to_name() {
        assert_eq!(uri_to_name("git://github.com/sample/test"), "test");
        assert_eq!(uri_to_name("git://github.com/sample/test.git"), "test");
        assert_eq!(uri_to_name("github.com:test"), "test");
        assert_eq!(uri_to_name("github.com:test.git"), "test");
        assert_eq!(uri_to_name("https://hg.mozilla.org/mozilla-central/"), "mozilla-central");
    }

    #[test]
    fn test_parse_with_uri() {
        let arg = ProjectArg::parse(
            "GITgithub.com:sample/remote_name->/work/repos/local_path@abc1234..1234abc",
            &repos(),
        )
        .unwrap();

        assert_eq!(arg.vcs(), RepositoryKind::Git);
        assert_eq!(arg.uri(), Some("github.com:sample/remote_name"));
        assert_eq!(arg.local_path(), Path::new("/work/repos/local_path"));
        assert_eq!(arg.name(), "local_path");
        assert_eq!(arg.good(), "abc1234");
        assert_eq!(arg.bad(), "1234abc");
    }

    #[test]
    fn test_parse_local_path_with_prefix() {
        let arg = ProjectArg::parse("HG/nonexistent/gecko@good..bad", &repos()).unwrap();
        assert_eq!(arg.vcs(), RepositoryKind::Hg);
        assert_eq!(arg.uri(), None);
        assert_eq!(arg.name(), "gecko");
    }

    #[test]
    fn test_parse_remote_without_local_path() {
        let arg = ProjectArg::parse("https://github.com/mozilla-b2g/gaia.git@v1..v2", &repos())
            .unwrap();
        assert_eq!(arg.vcs(), RepositoryKind::Git);
        assert_eq!(arg.uri(), Some("https://github.com/mozilla-b2g/gaia.git"));
        assert_eq!(arg.local_path(), Path::new("/work/repos/gaia"));
        assert_eq!(arg.name(), "gaia");

        let arg = ProjectArg::parse("github.com:mozilla-b2g/gaia@v1..v2", &repos()).unwrap();
        assert_eq!(arg.local_path(), Path::new("/work/repos/gaia"));
    }

    #[test]
    fn test_parse_range_uses_last_at() {
        let arg = ProjectArg::parse("GITgit@github.com:me/gaia->gaia@v1..v2", &repos()).unwrap();
        assert_eq!(arg.uri(), Some("git@github.com:me/gaia"));
        assert_eq!(arg.good(), "v1");
    }

    #[test]
    fn test_guess_vcs() {
        let cases = [
            ("github.com:foo/bar.git", RepositoryKind::Git),
            ("git://github.com:foo/bar.git", RepositoryKind::Git),
            ("git://github.com:foo/bar", RepositoryKind::Git),
            ("https://hg.mozilla.org/foo", RepositoryKind::Hg),
        ];
        for (uri, expected) in cases {
            let arg = ProjectArg::parse(&format!("{}->bar@good..bad", uri), &repos()).unwrap();
            assert_eq!(arg.vcs(), expected, "{}", uri);
        }
    }

    #[test]
    fn test_ambiguous_vcs() {
        let err = ProjectArg::parse("https://zombo.com/test->notspecific@good..bad", &repos())
            .unwrap_err();
        assert!(matches!(err, ProjectArgError::AmbiguousVcs(_)));

        let err = ProjectArg::parse("/nonexistent/plain@good..bad", &repos()).unwrap_err();
        assert!(matches!(err, ProjectArgError::AmbiguousVcs(_)));
    }

    #[test]
    fn test_conflicting_vcs_clues() {
        let err = ProjectArg::parse(
            "github.comhg.mozilla.org/mozilla-central->notspecific@good..bad",
            &repos(),
        )
        .unwrap_err();
        assert!(matches!(err, ProjectArgError::ConflictingVcs(_)));

        let err = ProjectArg::parse(
            "git://hg.mozilla.org/mozilla-central->notspecific@good..bad",
            &repos(),
        )
        .unwrap_err();
        assert!(matches!(err, ProjectArgError::ConflictingVcs(_)));

        let err = ProjectArg::parse("HGgithub.com:foo/bar->bar@good..bad", &repos()).unwrap_err();
        assert!(matches!(err, ProjectArgError::ConflictingVcs(_)));
    }

    #[test]
    fn test_malformed() {
        for bad in [
            "gaia",
            "gaia@good",
            "gaia@..bad",
            "gaia@good..",
            "@good..bad",
            "->gaia@good..bad",
            "GITgithub.com:foo->@good..bad",
        ] {
            assert!(
                matches!(
                    ProjectArg::parse(bad, &repos()),
                    Err(ProjectArgError::Malformed(_))
                ),
                "{}",
                bad
            );
        }
    }

    #[test]
    fn test_detects_local_clone() {
        let dir = TempDir::new().unwrap();
        let gaia = dir.path().join("gaia");
        std::fs::create_dir_all(gaia.join(".git")).unwrap();
        let gecko = dir.path().join("gecko");
        std::fs::create_dir_all(gecko.join(".hg")).unwrap();

        let arg = ProjectArg::parse(&format!("{}@a..b", gaia.display()), &repos()).unwrap();
        assert_eq!(arg.vcs(), RepositoryKind::Git);
        assert_eq!(arg.uri(), None);

        let arg = ProjectArg::parse(&format!("{}@a..b", gecko.display()), &repos()).unwrap();
        assert_eq!(arg.vcs(), RepositoryKind::Hg);
    }

    #[test]
    fn test_display() {
        let with_uri = "GITgithub.com:sample/remote_name->/work/repos/local_path@abc1234..1234abc";
        let arg = ProjectArg::parse(with_uri, &repos()).unwrap();
        assert_eq!(arg.to_string(), with_uri);

        let local = "HG/nonexistent/gecko@good..bad";
        let arg = ProjectArg::parse(local, &repos()).unwrap();
        assert_eq!(arg.to_string(), local);
    }

    #[test]
    fn test_display_round_trip_fixes_guessed_vcs() {
        let arg = ProjectArg::parse("https://hg.mozilla.org/releases/mozilla-b2g18@a..b", &repos())
            .unwrap();
        assert_eq!(
            arg.to_string(),
            "HGhttps://hg.mozilla.org/releases/mozilla-b2g18->/work/repos/mozilla-b2g18@a..b"
        );
        assert_eq!(ProjectArg::parse(&arg.to_string(), &repos()).unwrap(), arg);
    }
}
