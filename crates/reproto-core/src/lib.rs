//! Core data structures shared by every stage of the reproto compiler.
//!
//! # Architecture
//!
//! ```text
//! .reproto sources      resolved schema            emitted code
//! ────────────────     ─────────────────     ─────────────────────
//!                                          ┌─> C#          (per declaration)
//! Sources ──parse──> Schema ──namespace────┼─> Swift       (per package)
//! (source.rs)        (schema.rs)           └─> JavaScript  (per package)
//! ```
//!
//! The [`Schema`] is an arena: every declaration lives in a flat table owned by
//! its [`Package`], and references between declarations are [`DeclId`] handles.
//! Cyclic schemas (`A` holding an `A::Inner` that points back at `A`) need no
//! special treatment.
//!
//! Errors from every stage are converted into codespan [`Diagnostic`]s and
//! collected in [`Diagnostics`], which the CLI renders against [`Sources`].
//!
//! [`Diagnostic`]: codespan_reporting::diagnostic::Diagnostic

pub mod diagnostics;
pub mod namespace;
pub mod number;
pub mod package;
pub mod schema;
pub mod source;

pub use diagnostics::Diagnostics;
pub use namespace::{Namespace, NamespaceError, VersionScheme};
pub use number::{Number, NumberError};
pub use package::{PackageName, PackageRef};
pub use schema::*;
pub use semver::{Version, VersionReq};
pub use source::{FileId, Sources, Span, Spanned};
