//! Custom error types for repository operations

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Main error type for repofetch operations
///
/// Every variant maps to exit status 1. The variants exist so that callers
/// and tests can tell failures apart without matching on message text.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RepoError {
    /// The locator string could not be turned into a repository reference
    #[error("invalid locator '{locator}': {reason}")]
    InvalidLocator { locator: String, reason: String },

    /// The destination is already occupied
    #[error("{message}")]
    AlreadyExists { message: String },

    /// The working tree has uncommitted changes, so it cannot be synced
    #[error("can't sync: {} is dirty repo", .path.display())]
    DirtyWorkingTree {
        path: PathBuf,
        changes: String,
    },

    /// A required environment variable is not set
    #[error("{variable} is not set{}", detail_suffix(.detail))]
    MissingConfiguration { variable: String, detail: String },

    /// An external program exited unsuccessfully
    #[error("`{command}` {status}: {stderr}")]
    SubprocessFailure {
        command: String,
        code: Option<i32>,
        status: String,
        stderr: String,
    },

    /// The requested subdirectory was not present after checkout
    #[error("Source error: {message}")]
    SourceNotFound { message: String },

    /// Git itself is missing or unusable
    #[error("Git error: {message}")]
    Git { message: String },

    /// Filesystem precondition failed
    #[error("Filesystem error: {message}")]
    Filesystem { message: String },
}

fn detail_suffix(detail: &str) -> String {
    if detail.is_empty() {
        String::new()
    } else {
        format!(" ({detail})")
    }
}

impl RepoError {
    /// Create an invalid locator error
    #[inline]
    pub fn invalid_locator<L: Into<String>, R: Into<String>>(locator: L, reason: R) -> Self {
        Self::InvalidLocator {
            locator: locator.into(),
            reason: reason.into(),
        }
    }

    /// Create an already-exists error
    #[inline]
    pub fn already_exists<S: Into<String>>(message: S) -> Self {
        Self::AlreadyExists {
            message: message.into(),
        }
    }

    /// Create a dirty working tree error carrying the porcelain status output
    #[inline]
    pub fn dirty_working_tree<S: Into<String>>(path: &Path, changes: S) -> Self {
        Self::DirtyWorkingTree {
            path: path.to_path_buf(),
            changes: changes.into(),
        }
    }

    /// Create a missing configuration error for an environment variable
    #[inline]
    pub fn missing_configuration<V: Into<String>, D: Into<String>>(variable: V, detail: D) -> Self {
        Self::MissingConfiguration {
            variable: variable.into(),
            detail: detail.into(),
        }
    }

    /// Create a subprocess failure error
    ///
    /// Falls back to stdout when the program wrote nothing to stderr, since
    /// some tools (`gh` among them) report failures on stdout. Only the last
    /// non-empty line is kept: git prints progress (`Cloning into '.'...`)
    /// before the `fatal:` line that explains the failure.
    #[must_use]
    pub fn subprocess(command: String, code: Option<i32>, stderr: &str, stdout: &str) -> Self {
        let status = code.map_or_else(
            || "was terminated by a signal".to_owned(),
            |code| format!("exited with status {code}"),
        );
        let output = if stderr.trim().is_empty() {
            stdout
        } else {
            stderr
        };
        let last_line = output
            .lines()
            .map(str::trim)
            .rfind(|line| !line.is_empty())
            .unwrap_or_default();

        Self::SubprocessFailure {
            command,
            code,
            status,
            stderr: last_line.to_owned(),
        }
    }

    /// Create a source error
    #[inline]
    pub fn source_not_found<S: Into<String>>(message: S) -> Self {
        Self::SourceNotFound {
            message: message.into(),
        }
    }

    /// Create a git error
    #[inline]
    pub fn git<S: Into<String>>(message: S) -> Self {
        Self::Git {
            message: message.into(),
        }
    }

    /// Create a filesystem error
    #[inline]
    pub fn filesystem<S: Into<String>>(message: S) -> Self {
        Self::Filesystem {
            message: message.into(),
        }
    }

    /// Exit status reported by the binary for this error
    #[must_use]
    #[inline]
    pub const fn exit_code(&self) -> i32 {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subprocess_message_prefers_stderr() {
        let err = RepoError::subprocess(
            "git pull origin main".to_owned(),
            Some(1),
            "fatal: couldn't find remote ref main\n",
            "ignored",
        );
        assert_eq!(
            err.to_string(),
            "`git pull origin main` exited with status 1: fatal: couldn't find remote ref main"
        );
    }

    #[test]
    fn test_subprocess_message_keeps_last_line() {
        let err = RepoError::subprocess(
            "git clone --depth 1 https://github.com/a/b .".to_owned(),
            Some(128),
            "Cloning into '.'...\nremote: Repository not found.\nfatal: repository 'https://github.com/a/b/' not found\n\n",
            "",
        );
        let message = err.to_string();
        assert_eq!(
            message,
            "`git clone --depth 1 https://github.com/a/b .` exited with status 128: fatal: repository 'https://github.com/a/b/' not found"
        );
        assert!(!message.contains('\n'));
    }

    #[test]
    fn test_subprocess_message_falls_back_to_stdout() {
        let err = RepoError::subprocess("gh repo create a/b".to_owned(), None, "", "name taken\n");
        assert_eq!(
            err.to_string(),
            "`gh repo create a/b` was terminated by a signal: name taken"
        );
    }

    #[test]
    fn test_missing_configuration_message() {
        let bare = RepoError::missing_configuration("REPO_FETCHER_OWNER_ROOT", "");
        assert_eq!(bare.to_string(), "REPO_FETCHER_OWNER_ROOT is not set");

        let detailed = RepoError::missing_configuration("HOME", "no fallback destination root");
        assert_eq!(
            detailed.to_string(),
            "HOME is not set (no fallback destination root)"
        );
    }

    #[test]
    fn test_dirty_tree_message() {
        let err = RepoError::dirty_working_tree(Path::new("/work/repo"), " M src/lib.rs");
        assert_eq!(err.to_string(), "can't sync: /work/repo is dirty repo");
        assert_eq!(err.exit_code(), 1);
    }
}
