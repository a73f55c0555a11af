//! Configuration module
//!
//! CLI arguments, session configuration, and remote target parsing.

mod settings;

pub use settings::*;
