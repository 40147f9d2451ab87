//! Manage operation: adopt a local directory as a self-owned repository

use crate::config::Settings;
use crate::error::RepoError;
use crate::git::check_git_availability;
use crate::process::{CommandOutput, CommandRunner, Invocation, run_checked};
use crate::system::System;
use crate::utils::fs::ensure_dir_exists;
use crate::utils::path::{absolutize, is_plain_name};
use anyhow::{Context as _, Result};
use core::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Host the adopted repository is registered on
const REMOTE_HOST: &str = "github.com";

/// Visibility of a repository created through `gh repo create`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    /// Map the mutually exclusive `--public` / `--private` flags
    #[must_use]
    pub const fn from_flags(public: bool, private: bool) -> Option<Self> {
        match (public, private) {
            (_, true) => Some(Self::Private),
            (true, false) => Some(Self::Public),
            (false, false) => None,
        }
    }

    #[must_use]
    pub const fn flag(self) -> &'static str {
        match self {
            Self::Public => "--public",
            Self::Private => "--private",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Public => f.write_str("public"),
            Self::Private => f.write_str("private"),
        }
    }
}

/// Result of adopting a directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManageOutcome {
    pub destination: PathBuf,
    pub origin: String,
    /// Whether `gh repo create` was run
    pub created_remote: bool,
}

/// Moves a directory under the self-owner root and wires up its `origin`
#[non_exhaustive]
pub struct ManageOperation<'src> {
    source: PathBuf,
    owner: String,
    destination: PathBuf,
    name: String,
    visibility: Option<Visibility>,
    system: &'src dyn System,
    runner: &'src dyn CommandRunner,
}

impl<'src> ManageOperation<'src> {
    /// Validate configuration and inputs for adopting `directory`
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `REPO_FETCHER_OWNER_ROOT` or `REPO_FETCHER_OWNER` is unset
    /// - The directory does not exist or is not a directory
    /// - No repository name can be derived from the directory
    /// - The destination under the owner root is already taken
    pub fn new(
        directory: &Path,
        preferred_name: Option<String>,
        visibility: Option<Visibility>,
        settings: &Settings,
        system: &'src dyn System,
        runner: &'src dyn CommandRunner,
    ) -> Result<Self> {
        let owner_root = settings.require_owner_root()?;
        let owner = settings.require_owner()?.to_owned();

        let source = absolutize(system, directory)
            .with_context(|| format!("Cannot resolve {}", directory.display()))?;
        if !system.is_dir(&source) {
            return Err(RepoError::filesystem(format!(
                "'{}' is not an existing directory",
                source.display()
            ))
            .into());
        }

        let name = match preferred_name {
            Some(name) => name,
            None => source
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .ok_or_else(|| {
                    RepoError::filesystem(format!(
                        "cannot derive a repository name from '{}'",
                        source.display()
                    ))
                })?,
        };
        if !is_plain_name(&name) {
            return Err(RepoError::filesystem(format!(
                "'{name}' is not a valid repository name"
            ))
            .into());
        }

        let destination = owner_root.join(&name);
        if system.exists(&destination) {
            return Err(RepoError::already_exists(format!(
                "{} already exists",
                destination.display()
            ))
            .into());
        }

        Ok(Self {
            source,
            owner,
            destination,
            name,
            visibility,
            system,
            runner,
        })
    }

    /// Remote URL registered as `origin`
    #[must_use]
    pub fn origin(&self) -> String {
        format!("https://{REMOTE_HOST}/{}/{}", self.owner, self.name)
    }

    /// Execute the adoption
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Git is unavailable
    /// - The directory cannot be moved
    /// - Any `git` or `gh` command fails
    pub fn execute(&self) -> Result<ManageOutcome> {
        check_git_availability(self.runner)?;

        if let Some(owner_root) = self.destination.parent() {
            ensure_dir_exists(self.system, owner_root)?;
        }
        self.system
            .rename(&self.source, &self.destination)
            .with_context(|| {
                format!(
                    "Failed to move {} to {}",
                    self.source.display(),
                    self.destination.display()
                )
            })?;
        debug!(
            "Moved {} -> {}",
            self.source.display(),
            self.destination.display()
        );

        if !self.system.exists(&self.destination.join(".git")) {
            self.git(&["init"])?;
        }

        let remotes = self.git(&["remote"])?.stdout;
        let had_remote = !remotes.trim().is_empty();
        let has_origin = remotes.lines().any(|remote| remote.trim() == "origin");

        let origin = self.origin();
        if has_origin {
            self.git(&["remote", "set-url", "origin", origin.as_str()])?;
        } else {
            self.git(&["remote", "add", "origin", origin.as_str()])?;
        }
        info!("[repo:created] {} -> {}", self.destination.display(), origin);

        let created_remote = match self.visibility {
            Some(visibility) if !had_remote => {
                self.create_remote(visibility)?;
                true
            }
            Some(visibility) => {
                info!("Remote already configured, not creating a {visibility} repository");
                false
            }
            None => false,
        };

        Ok(ManageOutcome {
            destination: self.destination.clone(),
            origin,
            created_remote,
        })
    }

    fn git(&self, args: &[&str]) -> Result<CommandOutput> {
        run_checked(
            self.runner,
            &Invocation::git()
                .args(args)
                .current_dir(&self.destination),
        )
    }

    fn create_remote(&self, visibility: Visibility) -> Result<()> {
        let slug = format!("{}/{}", self.owner, self.name);
        run_checked(
            self.runner,
            &Invocation::new("gh")
                .args(["repo", "create", slug.as_str(), visibility.flag()])
                .current_dir(&self.destination),
        )
        .with_context(|| format!("Failed to create {visibility} repository {slug}"))?;

        info!("[repo:remote] created {visibility} repository {slug}");
        Ok(())
    }
}
