//! Real process runner built on `std::process::Command`

use super::{CommandOutput, CommandRunner, Invocation};
use indicatif::ProgressBar;
use std::io;
use std::process::{Command, Stdio};
use std::time::Duration;
use tracing::debug;

/// Production implementation of [`CommandRunner`]
///
/// Output is always captured. When `progress` is on, a spinner naming the
/// running command is drawn on stderr (indicatif hides it when stderr is not
/// a terminal).
#[derive(Debug, Clone, Copy, Default)]
pub struct RealRunner {
    progress: bool,
}

impl RealRunner {
    /// Create a runner without a progress spinner
    #[must_use]
    pub const fn new() -> Self {
        Self { progress: false }
    }

    /// Enable or disable the progress spinner
    #[must_use]
    pub const fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    fn spinner(&self, invocation: &Invocation) -> Option<ProgressBar> {
        if !self.progress {
            return None;
        }
        let spinner = ProgressBar::new_spinner();
        spinner.set_message(invocation.to_string());
        spinner.enable_steady_tick(Duration::from_millis(100));
        Some(spinner)
    }
}

impl CommandRunner for RealRunner {
    fn run(&self, invocation: &Invocation) -> io::Result<CommandOutput> {
        match &invocation.cwd {
            Some(cwd) => debug!("Running `{invocation}` in {}", cwd.display()),
            None => debug!("Running `{invocation}`"),
        }

        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(cwd) = &invocation.cwd {
            command.current_dir(cwd);
        }

        let spinner = self.spinner(invocation);
        let output = command.output();
        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }
        let output = output?;

        let result = CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        debug!("`{}` finished with {:?}", invocation.program, result.code);

        Ok(result)
    }
}
