//! Tooling & Integration Layer
//!
//! Provides the CLI surface over the core registry, materializer, inspector,
//! and reconciler operations.

pub mod cli;

pub use cli::{Cli, CliContext, Commands};
