//! Process execution abstraction
//!
//! Every external program (`git`, `gh`) is started through a [`CommandRunner`],
//! which returns a structured [`CommandOutput`] instead of a raw
//! `std::process::Output`. Tests swap in [`MockRunner`] to record invocations
//! and script results.

use crate::error::RepoError;
use anyhow::{Context as _, Result};
use core::fmt;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

pub mod mock;
pub mod real;

pub use mock::MockRunner;
pub use real::RealRunner;

/// A single program invocation: program, arguments and working directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

impl Invocation {
    /// Start building an invocation of `program`
    #[must_use]
    pub fn new<S: Into<String>>(program: S) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    /// Shorthand for an invocation of `git`
    #[must_use]
    pub fn git() -> Self {
        Self::new("git")
    }

    /// Append one argument
    #[must_use]
    pub fn arg<S: AsRef<str>>(mut self, arg: S) -> Self {
        self.args.push(arg.as_ref().to_owned());
        self
    }

    /// Append several arguments
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.args
            .extend(args.into_iter().map(|arg| arg.as_ref().to_owned()));
        self
    }

    /// Append a path argument
    #[must_use]
    pub fn path_arg(self, path: &Path) -> Self {
        let arg = path.to_string_lossy().into_owned();
        self.arg(arg)
    }

    /// Run the program inside `dir`
    #[must_use]
    pub fn current_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.cwd = Some(dir.into());
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Captured result of a finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when the process was killed by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// A successful run that printed `stdout`
    #[must_use]
    pub fn ok<S: Into<String>>(stdout: S) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A failed run with the given exit code and stderr
    #[must_use]
    pub fn failed<S: Into<String>>(code: i32, stderr: S) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    #[must_use]
    pub const fn success(&self) -> bool {
        matches!(self.code, Some(0))
    }
}

/// Runs external programs to completion
pub trait CommandRunner: Send + Sync {
    /// Run the invocation and wait for it to exit
    ///
    /// # Errors
    ///
    /// Returns an error only when the process could not be started.
    /// A non-zero exit is reported through [`CommandOutput::code`].
    fn run(&self, invocation: &Invocation) -> io::Result<CommandOutput>;
}

/// Run an invocation and turn a non-zero exit into [`RepoError::SubprocessFailure`]
///
/// # Errors
///
/// Returns an error if:
/// - The program cannot be started
/// - The program exits unsuccessfully
pub fn run_checked(runner: &dyn CommandRunner, invocation: &Invocation) -> Result<CommandOutput> {
    let output = runner
        .run(invocation)
        .with_context(|| format!("Failed to execute `{invocation}`"))?;

    if !output.success() {
        debug!(
            "`{invocation}` failed\n--- stdout ---\n{}\n--- stderr ---\n{}",
            output.stdout.trim_end(),
            output.stderr.trim_end()
        );
        return Err(RepoError::subprocess(
            invocation.to_string(),
            output.code,
            &output.stderr,
            &output.stdout,
        )
        .into());
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_display() {
        let invocation = Invocation::git()
            .args(["clone", "https://github.com/github/Spoon-Knife"])
            .path_arg(Path::new("/home/me/repo/github/Spoon-Knife"))
            .args(["--depth", "1"]);

        assert_eq!(
            invocation.to_string(),
            "git clone https://github.com/github/Spoon-Knife /home/me/repo/github/Spoon-Knife --depth 1"
        );
        assert_eq!(invocation.cwd, None);
    }

    #[test]
    fn test_run_checked_maps_failure() {
        let runner = MockRunner::with_handler(|_| CommandOutput::failed(128, "fatal: not a git repository"));
        let err = run_checked(&runner, &Invocation::git().arg("status")).unwrap_err();

        match err.downcast_ref::<RepoError>() {
            Some(RepoError::SubprocessFailure { command, code, stderr, .. }) => {
                assert_eq!(command, "git status");
                assert_eq!(*code, Some(128));
                assert_eq!(stderr, "fatal: not a git repository");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_run_checked_passes_output_through() {
        let runner = MockRunner::with_handler(|_| CommandOutput::ok("origin\n"));
        let output = run_checked(&runner, &Invocation::git().arg("remote")).unwrap();
        assert_eq!(output.stdout, "origin\n");
    }
}
