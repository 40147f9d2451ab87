//! Error handling module
//!
//! Defines the error kinds surfaced to the terminal

pub mod types;

pub use types::*;
