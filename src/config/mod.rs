//! JSON configuration for the command-line tools.

pub mod analyze;
pub mod split;
