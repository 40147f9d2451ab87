//! Git sparse checkout implementation

use crate::error::RepoError;
use crate::process::{CommandRunner, Invocation, run_checked};
use crate::system::{System, TempDirHandle};
use anyhow::{Context as _, Result};
use core::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Checks out a single subdirectory of a remote repository into a temporary directory
///
/// The temporary directory lives as long as this value. Move the checked out
/// subdirectory out of [`SparseCheckout::source_path`] before dropping it.
#[non_exhaustive]
pub struct SparseCheckout<'src> {
    pub clone_url: String,
    pub branch: Option<String>,
    pub subdir: String,
    temp_dir: Box<dyn TempDirHandle>,
    system: &'src dyn System,
    runner: &'src dyn CommandRunner,
}

impl<'src> SparseCheckout<'src> {
    /// Create a new sparse checkout operation
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary directory cannot be created
    #[inline]
    pub fn new(
        system: &'src dyn System,
        runner: &'src dyn CommandRunner,
        clone_url: String,
        branch: Option<String>,
        subdir: String,
    ) -> Result<Self> {
        let temp_dir = system
            .create_temp_dir()
            .context("Failed to create temporary directory for Git operations")?;

        Ok(Self {
            clone_url,
            branch,
            subdir,
            temp_dir,
            system,
            runner,
        })
    }

    /// Execute the sparse checkout operation
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The repository cannot be cloned
    /// - The sparse checkout cannot be initialized
    /// - The subdirectory cannot be added to the sparse checkout
    /// - The working tree cannot be checked out
    #[inline]
    pub fn execute(&self) -> Result<PathBuf> {
        let repo_path = self.temp_dir.path();
        debug!("Executing sparse checkout in {}", repo_path.display());

        self.clone_repository(repo_path)?;
        debug!("Repository cloned");

        run_checked(
            self.runner,
            &Invocation::git()
                .args(["sparse-checkout", "init"])
                .current_dir(repo_path),
        )
        .context("Failed to initialize sparse checkout")?;
        debug!("Sparse checkout initialized");

        run_checked(
            self.runner,
            &Invocation::git()
                .args(["sparse-checkout", "add", self.subdir.as_str()])
                .current_dir(repo_path),
        )
        .context("Failed to add sparse checkout path")?;
        debug!("Sparse checkout scoped to {}", self.subdir);

        run_checked(
            self.runner,
            &Invocation::git().arg("checkout").current_dir(repo_path),
        )
        .context("Failed to check out working tree")?;
        debug!("Working tree checked out");

        Ok(self.source_path())
    }

    /// Shallow, blob-filtered, sparse clone without checkout into `repo_path`
    fn clone_repository(&self, repo_path: &Path) -> Result<()> {
        let mut clone = Invocation::git().args([
            "clone",
            "--filter=blob:none",
            "--no-checkout",
            "--depth",
            "1",
            "--sparse",
        ]);
        if let Some(branch) = &self.branch {
            clone = clone.args(["--branch", branch.as_str()]);
        }
        let clone = clone
            .args([self.clone_url.as_str(), "."])
            .current_dir(repo_path);

        run_checked(self.runner, &clone)
            .with_context(|| format!("Failed to clone repository '{}'", self.clone_url))?;
        Ok(())
    }

    /// Path of the requested subdirectory inside the temporary checkout
    #[must_use]
    #[inline]
    pub fn source_path(&self) -> PathBuf {
        self.temp_dir.path().join(&self.subdir)
    }

    /// Get the path to the temporary directory
    #[must_use]
    #[inline]
    pub fn temp_path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Check if the requested subdirectory exists after checkout
    #[must_use]
    #[inline]
    pub fn source_exists(&self) -> bool {
        self.system.is_dir(&self.source_path())
    }

    /// Describe what was actually checked out, for when `source_exists()` is false
    ///
    /// # Errors
    ///
    /// Returns an error if the report cannot be formatted
    #[inline]
    pub fn checkout_diagnostics(&self) -> Result<String> {
        let repo_path = self.temp_dir.path();
        let mut diagnostics = String::new();

        writeln!(
            diagnostics,
            "Sparse checkout diagnostics:\n  Repository: {}\n  Branch: {}\n  Requested path: {}",
            self.clone_url,
            self.branch.as_deref().unwrap_or("(remote default)"),
            self.subdir
        )?;

        diagnostics.push_str("  Checked out entries:\n");
        match self.system.read_dir(repo_path) {
            Ok(entries) => {
                let found: Vec<String> = entries
                    .iter()
                    .filter_map(|entry| entry.file_name())
                    .map(|name| name.to_string_lossy().into_owned())
                    .filter(|name| name != ".git")
                    .collect();

                if found.is_empty() {
                    writeln!(diagnostics, "    (empty - no files were checked out)")?;
                } else {
                    for item in found {
                        writeln!(diagnostics, "    - {item}")?;
                    }
                }
            }
            Err(_) => writeln!(diagnostics, "    (unable to read directory)")?,
        }

        Ok(diagnostics)
    }
}

/// Check if Git is available and meets minimum version requirements
///
/// # Errors
///
/// Returns an error if:
/// - The Git command is not found
/// - The Git command failed to execute properly
/// - The Git version is too old
#[inline]
pub fn check_git_availability(runner: &dyn CommandRunner) -> Result<()> {
    let output = runner
        .run(&Invocation::git().arg("--version"))
        .map_err(|e| {
            RepoError::git(format!(
                "Git command not found ({e}). Please ensure Git is installed and available in PATH"
            ))
        })?;

    if !output.success() {
        return Err(RepoError::git("Git command failed to execute properly").into());
    }

    // `git sparse-checkout` needs Git 2.25+
    if let Some(version_part) = output.stdout.split_whitespace().nth(2)
        && let Ok(version) = parse_git_version(version_part)
        && version < (2, 25, 0)
    {
        return Err(RepoError::git(format!(
            "Git version {version_part} is too old. repofetch requires Git 2.25.0 or later for sparse checkout support"
        ))
        .into());
    }

    Ok(())
}

/// Parse Git version string into tuple (major, minor, patch)
///
/// Vendor suffixes such as `2.39.3 (Apple Git-146)` or `2.45.1.windows.1`
/// are ignored.
///
/// # Errors
///
/// Returns an error if the version string is invalid
#[inline]
pub fn parse_git_version(version: &str) -> Result<(u32, u32, u32)> {
    let parts: Vec<&str> = version.split('.').collect();
    if parts.len() >= 3 {
        let major = parts[0].parse().context("Invalid major version")?;
        let minor = parts[1].parse().context("Invalid minor version")?;
        let patch = parts[2].parse().context("Invalid patch version")?;
        Ok((major, minor, patch))
    } else {
        Err(anyhow::anyhow!("Invalid version format"))
    }
}
