//! Configuration module
//!
//! Settings are read from the environment once at startup and passed by
//! reference into the operations; nothing below this module reads the
//! environment directly.

pub mod settings;

pub use settings::*;
