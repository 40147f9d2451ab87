//! Repository locator parsing
//!
//! A locator names a remote repository and optionally a branch and a
//! subdirectory inside it. Three shapes are accepted:
//!
//! - `https://host/owner/repo[.git][/tree/<branch>/<path...>]`
//! - `git@host:owner/repo[.git][/tree/<branch>/<path...>]`
//! - `owner/repo[/tree/<branch>][/<path...>][:<path>]`
//!
//! Only the shorthand treats extra segments after `owner/repo` as a path.
//! In the URL forms anything but `tree/<branch>/...` is a web page such as
//! `issues` or `blob/main/README.md` and names the whole repository.

use crate::error::RepoError;
use crate::utils::path::{is_plain_name, is_safe_subpath, path_segments};
use core::fmt;
use core::str::FromStr;
use percent_encoding::percent_decode_str;
use url::Url;

/// Host used for the shorthand form and for clone URLs built from it
pub const DEFAULT_HOST: &str = "github.com";

/// Branch assumed when the locator does not name one
pub const DEFAULT_BRANCH: &str = "main";

/// Meaning of the segments after `owner/repo` when no `tree` segment follows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrailingSegments {
    /// Subdirectory inside the repository
    Subdir,
    /// Dropped
    Ignored,
}

/// A validated reference to a repository, branch and optional subdirectory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryReference {
    host: String,
    owner: String,
    repo: String,
    branch: Option<String>,
    subdir: String,
}

impl RepositoryReference {
    /// Parse a locator string
    ///
    /// # Errors
    ///
    /// Returns [`RepoError::InvalidLocator`] if:
    /// - The owner or repository segment is missing or not a plain name
    /// - A `tree` segment is not followed by a branch
    /// - The subdirectory contains `.` or `..` segments
    /// - An HTTPS locator is not a valid URL
    pub fn parse(locator: &str) -> Result<Self, RepoError> {
        let locator = locator.trim();

        if locator.starts_with("https://") || locator.starts_with("http://") {
            parse_url(locator)
        } else if locator.starts_with("git@") {
            parse_scp_like(locator)
        } else {
            parse_shorthand(locator)
        }
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    #[must_use]
    pub fn repo(&self) -> &str {
        &self.repo
    }

    /// Branch named by the locator, or `main`
    #[must_use]
    pub fn branch(&self) -> &str {
        self.branch.as_deref().unwrap_or(DEFAULT_BRANCH)
    }

    /// Branch only when the locator spelled it out via `/tree/<branch>`
    #[must_use]
    pub fn explicit_branch(&self) -> Option<&str> {
        self.branch.as_deref()
    }

    /// Subdirectory inside the repository, empty for the whole repository
    #[must_use]
    pub fn subdir(&self) -> &str {
        &self.subdir
    }

    #[must_use]
    pub fn has_subdir(&self) -> bool {
        !self.subdir.is_empty()
    }

    /// HTTPS URL that git clones from
    #[must_use]
    pub fn clone_url(&self) -> String {
        format!("https://{}/{}/{}", self.host, self.owner, self.repo)
    }
}

impl FromStr for RepositoryReference {
    type Err = RepoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for RepositoryReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)?;
        if let Some(branch) = &self.branch {
            write!(f, "@{branch}")?;
        }
        if self.has_subdir() {
            write!(f, ":{}", self.subdir)?;
        }
        Ok(())
    }
}

fn parse_url(locator: &str) -> Result<RepositoryReference, RepoError> {
    let url = Url::parse(locator).map_err(|e| RepoError::invalid_locator(locator, e.to_string()))?;

    let host = url
        .host_str()
        .ok_or_else(|| RepoError::invalid_locator(locator, "URL has no host"))?;
    let host = match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_owned(),
    };

    let decoded = url
        .path_segments()
        .into_iter()
        .flatten()
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            percent_decode_str(segment)
                .decode_utf8()
                .map(|decoded| decoded.into_owned())
        })
        .collect::<Result<Vec<String>, _>>()
        .map_err(|e| RepoError::invalid_locator(locator, e.to_string()))?;
    let segments: Vec<&str> = decoded.iter().map(String::as_str).collect();

    from_segments(locator, host, &segments, TrailingSegments::Ignored, None)
}

fn parse_scp_like(locator: &str) -> Result<RepositoryReference, RepoError> {
    let (user_host, path) = locator
        .split_once(':')
        .ok_or_else(|| RepoError::invalid_locator(locator, "expected git@host:owner/repo"))?;

    let host = user_host
        .split_once('@')
        .map_or(user_host, |(_, host)| host);
    if host.is_empty() {
        return Err(RepoError::invalid_locator(locator, "missing host"));
    }

    let segments = path_segments(path);
    from_segments(
        locator,
        host.to_owned(),
        &segments,
        TrailingSegments::Ignored,
        None,
    )
}

fn parse_shorthand(locator: &str) -> Result<RepositoryReference, RepoError> {
    let (path, subdir_override) = match locator.split_once(':') {
        Some((path, subdir)) if !subdir.trim_matches('/').is_empty() => (path, Some(subdir)),
        Some((path, _)) => (path, None),
        None => (locator, None),
    };

    let segments = path_segments(path);
    from_segments(
        locator,
        DEFAULT_HOST.to_owned(),
        &segments,
        TrailingSegments::Subdir,
        subdir_override,
    )
}

/// Build a reference from `owner/repo/...` path segments
fn from_segments(
    locator: &str,
    host: String,
    segments: &[&str],
    trailing: TrailingSegments,
    subdir_override: Option<&str>,
) -> Result<RepositoryReference, RepoError> {
    let (owner, repo, rest) = match segments {
        [owner, repo, rest @ ..] => (*owner, *repo, rest),
        [_] => return Err(RepoError::invalid_locator(locator, "missing repository name")),
        [] => return Err(RepoError::invalid_locator(locator, "missing owner and repository")),
    };

    let repo = repo.strip_suffix(".git").unwrap_or(repo);
    if !is_plain_name(owner) {
        return Err(RepoError::invalid_locator(
            locator,
            format!("'{owner}' is not a valid owner"),
        ));
    }
    if !is_plain_name(repo) {
        return Err(RepoError::invalid_locator(
            locator,
            format!("'{repo}' is not a valid repository name"),
        ));
    }

    let (branch, paths): (Option<String>, &[&str]) = match (rest, trailing) {
        (["tree", branch, paths @ ..], _) => (Some((*branch).to_owned()), paths),
        (["tree"], _) => {
            return Err(RepoError::invalid_locator(
                locator,
                "missing branch after 'tree'",
            ));
        }
        (paths, TrailingSegments::Subdir) => (None, paths),
        (_, TrailingSegments::Ignored) => (None, &[]),
    };

    let subdir = match subdir_override {
        Some(subdir) => path_segments(subdir).join("/"),
        None => paths.join("/"),
    };
    if !is_safe_subpath(&subdir) {
        return Err(RepoError::invalid_locator(
            locator,
            format!("subdirectory '{subdir}' must stay inside the repository"),
        ));
    }

    Ok(RepositoryReference {
        host,
        owner: owner.to_owned(),
        repo: repo.to_owned(),
        branch,
        subdir,
    })
}
