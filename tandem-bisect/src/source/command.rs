use std::path::Path;
use std::process::{Command, Output};

use tandem_bisect_core::RepositoryError;

/// Run a VCS command and return its trimmed stdout, failing on a non-zero exit.
pub(crate) fn run(
    program: &str,
    workdir: Option<&Path>,
    args: &[&str],
) -> Result<String, RepositoryError> {
    let output = output(program, workdir, args)?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(RepositoryError::Command {
            command: display(program, args),
            stderr: stderr.trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Run a VCS command and return its raw output, whatever the exit status.
pub(crate) fn output(
    program: &str,
    workdir: Option<&Path>,
    args: &[&str],
) -> Result<Output, RepositoryError> {
    let mut cmd = Command::new(program);
    if let Some(dir) = workdir {
        cmd.current_dir(dir);
    }
    tracing::trace!("Running {}", self::display(program, args));

    cmd.args(args).output().map_err(|source| RepositoryError::Spawn {
        program: program.to_string(),
        source,
    })
}

fn display(program: &str, args: &[&str]) -> String {
    format!("{} {}", program, args.join(" "))
}
