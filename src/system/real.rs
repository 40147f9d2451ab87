//! Real system implementation using `std::env` and `std::fs`

use super::{System, TempDirHandle};
use crate::utils::fs::copy_tree;
use std::env::VarError;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

/// Production implementation of System trait
///
/// Delegates to the standard library's environment and filesystem functions.
#[derive(Debug, Clone, Copy)]
pub struct RealSystem;

impl RealSystem {
    /// Create a new `RealSystem` instance
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Default for RealSystem {
    fn default() -> Self {
        Self::new()
    }
}

/// Real temporary directory, removed from disk when dropped
struct RealTempDir(TempDir);

impl TempDirHandle for RealTempDir {
    fn path(&self) -> &Path {
        self.0.path()
    }
}

impl System for RealSystem {
    fn env_var(&self, key: &str) -> Result<String, VarError> {
        std::env::var(key)
    }

    fn home_dir(&self) -> Option<PathBuf> {
        dirs::home_dir()
    }

    fn current_dir(&self) -> io::Result<PathBuf> {
        std::env::current_dir()
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        if to.exists() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("Destination already exists: {}", to.display()),
            ));
        }

        match fs::rename(from, to) {
            Err(err) if err.kind() == io::ErrorKind::CrossesDevices => {
                debug!(
                    "rename across filesystems, copying {} -> {}",
                    from.display(),
                    to.display()
                );
                copy_tree(from, to)?;
                if from.is_dir() {
                    fs::remove_dir_all(from)
                } else {
                    fs::remove_file(from)
                }
            }
            other => other,
        }
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        fs::read_dir(path)?
            .map(|entry| entry.map(|e| e.path()))
            .collect()
    }

    fn create_temp_dir(&self) -> io::Result<Box<dyn TempDirHandle>> {
        let temp_dir = tempfile::Builder::new().prefix("repofetch-").tempdir()?;
        Ok(Box::new(RealTempDir(temp_dir)))
    }
}
