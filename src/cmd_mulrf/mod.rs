//! Subcommand modules for the `mulrf` binary.

pub mod build;
pub mod score;
pub mod stats;
pub mod utils;
