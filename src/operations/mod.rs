//! Operations module
//!
//! Orchestrates fetching repositories and adopting local directories

pub mod fetch;
pub mod manage;

pub use fetch::*;
pub use manage::*;
