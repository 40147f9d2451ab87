//! Git operations module
//!
//! Locator parsing and sparse checkout of a repository subdirectory

pub mod locator;
pub mod sparse_checkout;

pub use locator::*;
pub use sparse_checkout::*;
