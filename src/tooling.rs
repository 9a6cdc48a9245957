//! Tooling & Integration Layer
//!
//! Command-line access to a persistent registry.

pub mod cli;

pub use cli::{Cli, CliContext, Commands};
