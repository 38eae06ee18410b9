//! Driver errors.
//!
//! Compile-stage problems are reported as diagnostics; these errors cover
//! what happens around compilation: finding and reading sources, writing
//! output, and selecting targets, packages and declarations by name.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("source path `{}` is not a directory", .path.display())]
    MissingRoot { path: PathBuf },

    #[error("failed to walk sources: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("failed to read `{}`: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write `{}`: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("`{}` does not name a valid package (`{name}`)", .path.display())]
    InvalidPackageName { path: PathBuf, name: String },

    #[error("`{}` has an invalid version `{version}`: {message}", .path.display())]
    InvalidVersion {
        path: PathBuf,
        version: String,
        message: String,
    },

    #[error("package `{identity}` is defined by both `{}` and `{}`", .first.display(), .second.display())]
    DuplicatePackage {
        identity: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("unknown target `{name}`, available: {}", .available.join(", "))]
    UnknownTarget {
        name: String,
        available: Vec<&'static str>,
    },

    #[error("no package matches `{0}`")]
    UnknownPackage(String),

    #[error("`{name}` matches several package versions: {}", .candidates.join(", "))]
    AmbiguousPackage {
        name: String,
        candidates: Vec<String>,
    },

    #[error("expected `<package>::<Name>`, found `{0}`")]
    MalformedName(String),

    #[error("package `{package}` has no declaration `{path}`")]
    UnknownDecl { package: String, path: String },
}
