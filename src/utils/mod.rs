//! Filesystem and path helpers shared by the operations

pub mod fs;
pub mod path;
