//! Evaluators that judge a checked-out line by running an external program.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, ExitStatus};

use tandem_bisect_core::{Evaluator, EvaluatorError, Line, Verdict};

/// Exit code of the interactive `good` command.
pub const GOOD_EXIT: i32 = 69;

/// Exit code of the interactive `bad` command.
pub const BAD_EXIT: i32 = 96;

/// Environment variables naming the revision of every project in `line`,
/// as `BISECT_<PROJECT>_REV`.
pub fn line_env(line: &Line) -> Vec<(String, String)> {
    line.iter()
        .map(|rev| {
            let key: String = rev
                .project()
                .chars()
                .map(|c| {
                    if c.is_ascii_alphanumeric() {
                        c.to_ascii_uppercase()
                    } else {
                        '_'
                    }
                })
                .collect();
            (format!("BISECT_{}_REV", key), rev.id().to_string())
        })
        .collect()
}

/// Runs a shell command per line: exit code 0 passes, any other code fails.
#[derive(Debug, Clone)]
pub struct ScriptEvaluator {
    command: String,
    workdir: Option<PathBuf>,
}

impl ScriptEvaluator {
    pub fn new(command: impl Into<String>, workdir: Option<PathBuf>) -> Self {
        Self {
            command: command.into(),
            workdir,
        }
    }

    fn interpret(&self, status: ExitStatus) -> Result<Verdict, EvaluatorError> {
        match status.code() {
            Some(0) => Ok(Verdict::Pass),
            Some(_) => Ok(Verdict::Fail),
            None => Err(EvaluatorError::UnexpectedExit {
                command: self.command.clone(),
                status: status.to_string(),
            }),
        }
    }
}

impl Evaluator for ScriptEvaluator {
    fn evaluate(&mut self, line: &Line) -> Result<Verdict, EvaluatorError> {
        tracing::debug!("Running script evaluator: {}", self.command);

        let mut cmd = Command::new("sh");
        cmd.args(["-c", &self.command]).envs(line_env(line));
        if let Some(dir) = &self.workdir {
            cmd.current_dir(dir);
        }

        let status = cmd.status().map_err(|source| EvaluatorError::Spawn {
            command: self.command.clone(),
            source,
        })?;
        tracing::debug!("Script evaluator returned {}", status);

        self.interpret(status)
    }
}

/// Drops the user into a shell per line, where `good` and `bad` end the
/// session with a verdict and a plain `exit` aborts the bisection.
#[derive(Debug, Clone)]
pub struct InteractiveEvaluator {
    program: String,
    args: Vec<String>,
}

impl InteractiveEvaluator {
    /// `shell` is split on whitespace into a program and leading arguments.
    pub fn new(shell: &str) -> Result<Self, EvaluatorError> {
        let mut words = shell.split_whitespace().map(str::to_string);
        let program = words.next().ok_or(EvaluatorError::EmptyCommand)?;
        Ok(Self {
            program,
            args: words.collect(),
        })
    }

    /// The shell to use when none is configured: `$SHELL`, else `bash`.
    pub fn default_shell() -> String {
        std::env::var("SHELL")
            .ok()
            .filter(|shell| !shell.trim().is_empty())
            .unwrap_or_else(|| "bash".to_string())
    }

    fn rcfile_contents(line: &Line) -> String {
        let mut script = String::new();
        script.push_str("echo\n");
        script.push_str("echo \"Testing line:\"\n");
        for rev in line {
            script.push_str(&format!("echo \"  {}\"\n", rev));
        }
        script.push_str("echo\n");
        script.push_str("echo \"To mark this line, type either 'good' or 'bad'\"\n");
        script.push_str("echo \"Type 'exit' to stop bisecting\"\n");
        script.push_str("echo\n");
        script.push_str(&format!("good () {{ exit {}; }}\n", GOOD_EXIT));
        script.push_str(&format!("bad () {{ exit {}; }}\n", BAD_EXIT));
        script
    }

    fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn interpret(&self, status: ExitStatus) -> Result<Verdict, EvaluatorError> {
        match status.code() {
            Some(GOOD_EXIT) => Ok(Verdict::Pass),
            Some(BAD_EXIT) => Ok(Verdict::Fail),
            Some(0) => {
                tracing::warn!("Interactive shell exited without a verdict, stopping");
                Ok(Verdict::Abort)
            }
            _ => Err(EvaluatorError::UnexpectedExit {
                command: self.display(),
                status: status.to_string(),
            }),
        }
    }
}

impl Evaluator for InteractiveEvaluator {
    fn evaluate(&mut self, line: &Line) -> Result<Verdict, EvaluatorError> {
        let mut rcfile = tempfile::Builder::new()
            .prefix("tandem-bisect-")
            .suffix(".rc")
            .tempfile()?;
        rcfile.write_all(Self::rcfile_contents(line).as_bytes())?;
        rcfile.flush()?;

        let rcpath = rcfile.path().to_string_lossy().into_owned();
        let status = Command::new(&self.program)
            .args(&self.args)
            .args(["--rcfile", rcpath.as_str(), "--noprofile"])
            .env("PS1", "BISECT: $ ")
            .env("PS2", "> ")
            .env("IGNOREEOF", (1024 * 4).to_string())
            .envs(line_env(line))
            .status()
            .map_err(|source| EvaluatorError::Spawn {
                command: self.display(),
                source,
            })?;
        tracing::debug!("Interactive evaluator returned {}", status);

        self.interpret(status)
    }
}
