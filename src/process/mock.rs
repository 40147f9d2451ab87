//! Mock process runner for testing

use super::{CommandOutput, CommandRunner, Invocation};
use std::io;
use std::sync::Mutex;

type Handler = Box<dyn Fn(&Invocation) -> CommandOutput + Send + Sync>;

/// Records every invocation and answers with a scripted [`CommandOutput`]
///
/// The default handler reports success with empty output. A custom handler
/// can inspect the invocation and simulate the effect the real program would
/// have had, typically by writing into a shared [`MockSystem`](crate::system::MockSystem).
///
/// # Example
/// ```
/// use repofetch::process::{CommandOutput, CommandRunner, Invocation, MockRunner};
///
/// let runner = MockRunner::with_handler(|invocation| {
///     if invocation.args.first().map(String::as_str) == Some("status") {
///         CommandOutput::ok(" M README.md\n")
///     } else {
///         CommandOutput::ok("")
///     }
/// });
///
/// let output = runner.run(&Invocation::git().arg("status")).unwrap();
/// assert_eq!(output.stdout, " M README.md\n");
/// assert_eq!(runner.commands(), vec!["git status".to_owned()]);
/// ```
pub struct MockRunner {
    handler: Handler,
    invocations: Mutex<Vec<Invocation>>,
}

impl MockRunner {
    /// Runner where every command succeeds silently
    #[must_use]
    pub fn new() -> Self {
        Self::with_handler(|_| CommandOutput::ok(""))
    }

    /// Runner that answers each invocation through `handler`
    #[must_use]
    pub fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(&Invocation) -> CommandOutput + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            invocations: Mutex::new(Vec::new()),
        }
    }

    /// All invocations seen so far, in order
    #[must_use]
    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations
            .lock()
            .map(|recorded| recorded.clone())
            .unwrap_or_default()
    }

    /// Invocations rendered as command lines, in order
    #[must_use]
    pub fn commands(&self) -> Vec<String> {
        self.invocations()
            .iter()
            .map(ToString::to_string)
            .collect()
    }
}

impl Default for MockRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner for MockRunner {
    fn run(&self, invocation: &Invocation) -> io::Result<CommandOutput> {
        self.invocations
            .lock()
            .map_err(|e| io::Error::other(e.to_string()))?
            .push(invocation.clone());
        Ok((self.handler)(invocation))
    }
}
