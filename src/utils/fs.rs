//! File system utilities

use crate::system::System;
use anyhow::{Context as _, Result};
use std::fs;
use std::io;
use std::path::Path;
use walkdir::WalkDir;

/// Create parent directories for a path if they don't exist
pub fn create_parent_directories(system: &dyn System, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !system.exists(parent)
    {
        system.create_dir_all(parent).with_context(|| {
            format!(
                "Failed to create parent directories for: {}",
                path.display()
            )
        })?;
    }
    Ok(())
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir_exists(system: &dyn System, dir_path: &Path) -> Result<()> {
    if !system.exists(dir_path) {
        system
            .create_dir_all(dir_path)
            .with_context(|| format!("Failed to create directory: {}", dir_path.display()))?;
    } else if !system.is_dir(dir_path) {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("Path exists but is not a directory: {}", dir_path.display()),
        )
        .into());
    }
    Ok(())
}

/// Recursively copy a file or directory tree on the real filesystem
///
/// Used when a rename cannot cross filesystem boundaries. Symlinks are
/// recreated rather than followed.
pub fn copy_tree(from: &Path, to: &Path) -> io::Result<()> {
    for entry in WalkDir::new(from).follow_links(false) {
        let entry = entry.map_err(io::Error::other)?;
        let relative = entry
            .path()
            .strip_prefix(from)
            .map_err(io::Error::other)?;
        let target = if relative.as_os_str().is_empty() {
            to.to_path_buf()
        } else {
            to.join(relative)
        };

        let file_type = entry.file_type();
        if file_type.is_dir() {
            fs::create_dir_all(&target)?;
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(link: &Path, target: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(fs::read_link(link)?, target)
}

#[cfg(not(unix))]
fn copy_symlink(link: &Path, target: &Path) -> io::Result<()> {
    fs::copy(link, target).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::{MockSystem, RealSystem};
    use tempfile::TempDir;

    #[test]
    fn test_copy_tree_preserves_layout() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("source");
        fs::create_dir_all(source.join("nested/deeper")).unwrap();
        fs::write(source.join("top.txt"), "top").unwrap();
        fs::write(source.join("nested/deeper/leaf.txt"), "leaf").unwrap();

        let target = temp_dir.path().join("target");
        copy_tree(&source, &target).unwrap();

        assert_eq!(fs::read_to_string(target.join("top.txt")).unwrap(), "top");
        assert_eq!(
            fs::read_to_string(target.join("nested/deeper/leaf.txt")).unwrap(),
            "leaf"
        );
        // copy leaves the source alone
        assert!(source.join("top.txt").exists());
    }

    #[test]
    fn test_create_parent_directories() {
        let system = RealSystem::new();
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a/b/c/dest");

        create_parent_directories(&system, &nested).unwrap();
        assert!(nested.parent().unwrap().is_dir());
        assert!(!nested.exists());
    }

    #[test]
    fn test_create_parent_directories_relative_leaf() {
        let system = MockSystem::new();
        // a bare name has an empty parent, nothing to create
        create_parent_directories(&system, Path::new("lib")).unwrap();
    }

    #[test]
    fn test_ensure_dir_exists_rejects_file() {
        let system = MockSystem::new().with_file("/root/file", b"x").unwrap();

        ensure_dir_exists(&system, Path::new("/root/new")).unwrap();
        assert!(system.is_dir(Path::new("/root/new")));
        assert!(ensure_dir_exists(&system, Path::new("/root/file")).is_err());
    }
}
