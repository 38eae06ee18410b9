//! Driver for the reproto schema compiler.
//!
//! ```text
//! paths ──discover──▶ Sources ──parse──▶ AST ──resolve──▶ Schema ──emit──▶ files
//!                                                             │
//!                                                             └──codec──▶ validated JSON
//! ```
//!
//! The `reproto` binary is a thin layer over [`pipeline`]: it merges
//! [`config`] with command-line flags, runs a pipeline stage and renders the
//! collected diagnostics.

pub mod commands;
pub mod config;
pub mod discover;
mod error;
pub mod pipeline;

pub use config::{ConfigError, ReprotoConfig};
pub use discover::{Discovered, discover};
pub use error::LoadError;
pub use pipeline::{BuildReport, BuildSettings, Compilation, build, check, compile, load};
