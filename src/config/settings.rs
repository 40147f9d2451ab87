//! Environment-driven settings and destination resolution

use crate::error::RepoError;
use crate::git::RepositoryReference;
use crate::system::System;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The "self" owner identity
pub const OWNER_VAR: &str = "REPO_FETCHER_OWNER";

/// Local root for self-owned repositories and adoption targets
pub const OWNER_ROOT_VAR: &str = "REPO_FETCHER_OWNER_ROOT";

/// Local root for every other repository
pub const ROOT_VAR: &str = "REPO_FETCHER_ROOT";

/// Directory under the home directory used when no root is configured
pub const FALLBACK_ROOT_DIR: &str = "repo";

/// Configuration read once at startup and passed into every operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub owner: Option<String>,
    pub owner_root: Option<PathBuf>,
    pub repo_root: Option<PathBuf>,
    pub home: Option<PathBuf>,
}

impl Settings {
    /// Read settings from the environment
    ///
    /// `root_override` (the `--root` flag) takes precedence over
    /// `REPO_FETCHER_ROOT`. Empty variables count as unset.
    #[must_use]
    pub fn from_system(system: &dyn System, root_override: Option<&Path>) -> Self {
        let var = |key: &str| system.env_var(key).ok().filter(|value| !value.is_empty());

        let settings = Self {
            owner: var(OWNER_VAR),
            owner_root: var(OWNER_ROOT_VAR).map(PathBuf::from),
            repo_root: root_override
                .map(Path::to_path_buf)
                .or_else(|| var(ROOT_VAR).map(PathBuf::from)),
            home: system.home_dir(),
        };
        debug!("Settings: {settings:?}");
        settings
    }

    /// Pick the local destination for a repository
    ///
    /// First match wins:
    /// 1. `explicit`, verbatim
    /// 2. `<owner_root>/<repo>` when the reference belongs to the self owner
    /// 3. `<repo_root>/<owner>/<repo>`
    /// 4. `<home>/repo/<owner>/<repo>`
    ///
    /// # Errors
    ///
    /// Returns [`RepoError::MissingConfiguration`] when the fallback is needed
    /// but no home directory is known
    pub fn resolve_destination(
        &self,
        reference: &RepositoryReference,
        explicit: Option<&Path>,
    ) -> Result<PathBuf, RepoError> {
        if let Some(explicit) = explicit {
            return Ok(explicit.to_path_buf());
        }

        if let (Some(owner), Some(owner_root)) = (&self.owner, &self.owner_root)
            && owner == reference.owner()
        {
            return Ok(owner_root.join(reference.repo()));
        }

        if let Some(repo_root) = &self.repo_root {
            return Ok(repo_root.join(reference.owner()).join(reference.repo()));
        }

        let home = self.home.as_ref().ok_or_else(|| {
            RepoError::missing_configuration(
                "HOME",
                format!("set {ROOT_VAR} or pass --root to choose where repositories go"),
            )
        })?;
        Ok(home
            .join(FALLBACK_ROOT_DIR)
            .join(reference.owner())
            .join(reference.repo()))
    }

    /// The self owner, required by `manage`
    ///
    /// # Errors
    ///
    /// Returns [`RepoError::MissingConfiguration`] if `REPO_FETCHER_OWNER` is unset
    pub fn require_owner(&self) -> Result<&str, RepoError> {
        self.owner
            .as_deref()
            .ok_or_else(|| RepoError::missing_configuration(OWNER_VAR, ""))
    }

    /// The self owner root, required by `manage`
    ///
    /// # Errors
    ///
    /// Returns [`RepoError::MissingConfiguration`] if `REPO_FETCHER_OWNER_ROOT` is unset
    pub fn require_owner_root(&self) -> Result<&Path, RepoError> {
        self.owner_root
            .as_deref()
            .ok_or_else(|| RepoError::missing_configuration(OWNER_ROOT_VAR, ""))
    }
}
