//! Fetch operation: clone, sync, or sparse-checkout a subdirectory

use crate::error::RepoError;
use crate::git::{RepositoryReference, SparseCheckout, check_git_availability};
use crate::process::{CommandRunner, Invocation, run_checked};
use crate::system::System;
use crate::utils::fs::create_parent_directories;
use anyhow::{Context as _, Result};
use std::path::PathBuf;
use tracing::{debug, info};

/// What a fetch ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Fresh shallow clone of the whole repository
    Cloned,
    /// Existing clean checkout pulled from origin
    Synced,
    /// Subdirectory materialized through sparse checkout
    CheckedOut,
}

/// Coordinates fetching one repository reference into one destination
#[non_exhaustive]
pub struct FetchOperation<'src> {
    reference: RepositoryReference,
    destination: PathBuf,
    branch_override: Option<String>,
    system: &'src dyn System,
    runner: &'src dyn CommandRunner,
}

impl<'src> FetchOperation<'src> {
    #[must_use]
    pub fn new(
        reference: RepositoryReference,
        destination: PathBuf,
        branch_override: Option<String>,
        system: &'src dyn System,
        runner: &'src dyn CommandRunner,
    ) -> Self {
        Self {
            reference,
            destination,
            branch_override,
            system,
            runner,
        }
    }

    /// Execute the fetch
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A subdirectory checkout targets an existing destination
    /// - A sync targets a working tree with uncommitted changes
    /// - Git is unavailable or any git command fails
    /// - The checked out subdirectory cannot be moved into place
    pub fn execute(&self) -> Result<FetchOutcome> {
        if self.reference.has_subdir() {
            return self.checkout_subdirectory();
        }

        check_git_availability(self.runner)?;
        if self.system.exists(&self.destination) {
            self.sync()
        } else {
            self.clone_fresh()
        }
    }

    /// Sparse checkout of the reference's subdirectory into a new destination
    fn checkout_subdirectory(&self) -> Result<FetchOutcome> {
        if self.system.exists(&self.destination) {
            return Err(RepoError::already_exists(format!(
                "directory checkout is only supported for new repo: {} already exists",
                self.destination.display()
            ))
            .into());
        }

        check_git_availability(self.runner)?;

        let clone_url = self.reference.clone_url();
        let branch = self
            .branch_override
            .as_deref()
            .or_else(|| self.reference.explicit_branch())
            .map(ToOwned::to_owned);

        let checkout = SparseCheckout::new(
            self.system,
            self.runner,
            clone_url.clone(),
            branch,
            self.reference.subdir().to_owned(),
        )?;
        let source = checkout.execute().context("Sparse checkout failed")?;

        if !checkout.source_exists() {
            let diagnostics = checkout.checkout_diagnostics()?;
            info!("{}", diagnostics.trim_end());
            return Err(RepoError::source_not_found(format!(
                "'{}' not found in repository '{}'",
                self.reference.subdir(),
                clone_url
            ))
            .into());
        }

        create_parent_directories(self.system, &self.destination)?;
        self.system
            .rename(&source, &self.destination)
            .with_context(|| {
                format!(
                    "Failed to move {} to {}",
                    source.display(),
                    self.destination.display()
                )
            })?;

        // the temporary clone goes away with the checkout
        drop(checkout);

        info!(
            "[repo:checkout] {}/{} -> {}",
            clone_url,
            self.reference.subdir(),
            self.destination.display()
        );
        Ok(FetchOutcome::CheckedOut)
    }

    /// Pull into an existing clone, refusing when it has local changes
    fn sync(&self) -> Result<FetchOutcome> {
        let status = run_checked(
            self.runner,
            &Invocation::git()
                .args(["status", "--porcelain"])
                .current_dir(&self.destination),
        )
        .with_context(|| format!("Failed to inspect {}", self.destination.display()))?;

        if !status.stdout.trim().is_empty() {
            debug!("Pending changes:\n{}", status.stdout.trim_end());
            return Err(RepoError::dirty_working_tree(&self.destination, status.stdout).into());
        }

        let branch = self
            .branch_override
            .as_deref()
            .unwrap_or_else(|| self.reference.branch());
        run_checked(
            self.runner,
            &Invocation::git()
                .args(["pull", "origin", branch])
                .current_dir(&self.destination),
        )?;

        info!("[repo:sync] {} ({branch})", self.destination.display());
        Ok(FetchOutcome::Synced)
    }

    /// Shallow clone into a new destination
    ///
    /// Without an explicit `--branch` the remote's default branch is used.
    fn clone_fresh(&self) -> Result<FetchOutcome> {
        let clone_url = self.reference.clone_url();
        create_parent_directories(self.system, &self.destination)?;

        let mut clone = Invocation::git()
            .args(["clone", clone_url.as_str()])
            .path_arg(&self.destination)
            .args(["--depth", "1"]);
        if let Some(branch) = &self.branch_override {
            clone = clone.args(["--branch", branch.as_str()]);
        }
        run_checked(self.runner, &clone)?;

        info!(
            "[repo:clone] {} -> {}",
            clone_url,
            self.destination.display()
        );
        Ok(FetchOutcome::Cloned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{CommandOutput, MockRunner};
    use crate::system::MockSystem;
    use std::path::Path;

    fn reference(locator: &str) -> RepositoryReference {
        RepositoryReference::parse(locator).unwrap()
    }

    #[test]
    fn test_fresh_clone_uses_remote_default_branch() {
        let system = MockSystem::new().with_dir("/home/me").unwrap();
        let runner = MockRunner::new();

        let outcome = FetchOperation::new(
            reference("github/Spoon-Knife"),
            PathBuf::from("/home/me/repo/github/Spoon-Knife"),
            None,
            &system,
            &runner,
        )
        .execute()
        .unwrap();

        assert_eq!(outcome, FetchOutcome::Cloned);
        assert_eq!(
            runner.commands(),
            vec![
                "git --version",
                "git clone https://github.com/github/Spoon-Knife /home/me/repo/github/Spoon-Knife --depth 1",
            ]
        );
        assert!(system.is_dir(Path::new("/home/me/repo/github")));
    }

    #[test]
    fn test_fresh_clone_with_branch_override() {
        let system = MockSystem::new();
        let runner = MockRunner::new();

        FetchOperation::new(
            reference("https://github.com/a/b/tree/dev"),
            PathBuf::from("/r/a/b"),
            Some("release".to_owned()),
            &system,
            &runner,
        )
        .execute()
        .unwrap();

        assert_eq!(
            runner.commands()[1],
            "git clone https://github.com/a/b /r/a/b --depth 1 --branch release"
        );
    }

    #[test]
    fn test_sync_pulls_reference_branch() {
        let system = MockSystem::new().with_dir("/r/a/b").unwrap();
        let runner = MockRunner::new();

        let outcome = FetchOperation::new(
            reference("https://github.com/a/b/tree/dev"),
            PathBuf::from("/r/a/b"),
            None,
            &system,
            &runner,
        )
        .execute()
        .unwrap();

        assert_eq!(outcome, FetchOutcome::Synced);
        let invocations = runner.invocations();
        assert_eq!(invocations[1].to_string(), "git status --porcelain");
        assert_eq!(invocations[2].to_string(), "git pull origin dev");
        assert_eq!(invocations[2].cwd.as_deref(), Some(Path::new("/r/a/b")));
    }

    #[test]
    fn test_sync_failure_propagates() {
        let system = MockSystem::new().with_dir("/r/a/b").unwrap();
        let runner = MockRunner::with_handler(|invocation| {
            if invocation.args.first().map(String::as_str) == Some("pull") {
                CommandOutput::failed(1, "fatal: couldn't find remote ref main")
            } else {
                CommandOutput::ok("")
            }
        });

        let err = FetchOperation::new(
            reference("a/b"),
            PathBuf::from("/r/a/b"),
            None,
            &system,
            &runner,
        )
        .execute()
        .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<RepoError>(),
            Some(RepoError::SubprocessFailure { .. })
        ));
    }
}
