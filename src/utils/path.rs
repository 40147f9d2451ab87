//! Path manipulation and validation utilities

use crate::system::System;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Normalize a path by resolving `.` and `..` components
#[must_use]
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // Keep leading '..' components, otherwise drop the previous one
                match components.last() {
                    None | Some(Component::ParentDir) => components.push(component),
                    Some(Component::RootDir | Component::Prefix(_)) => {}
                    Some(_) => {
                        components.pop();
                    }
                }
            }
            _ => {
                components.push(component);
            }
        }
    }

    components.iter().collect()
}

/// Resolve a possibly relative path against the current directory and normalize it
pub fn absolutize(system: &dyn System, path: &Path) -> io::Result<PathBuf> {
    if path.is_absolute() {
        return Ok(normalize_path(path));
    }
    Ok(normalize_path(&system.current_dir()?.join(path)))
}

/// Check that a single name (owner, repository) is usable as a path component
#[must_use]
pub fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
}

/// Split a slash separated path into its non-empty segments
#[must_use]
pub fn path_segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|segment| !segment.is_empty()).collect()
}

/// Check that a repository-relative path stays inside the repository
///
/// Rejects `.` and `..` segments and backslashes; an empty path is accepted.
#[must_use]
pub fn is_safe_subpath(path: &str) -> bool {
    path_segments(path).into_iter().all(is_plain_name)
}
