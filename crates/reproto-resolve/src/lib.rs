//! Name and version resolution.
//!
//! Takes one parsed file per package and produces the arena [`Schema`]:
//!
//! 1. package identities are checked for duplicates and given namespaces;
//! 2. declarations are registered so nested names are known up front;
//! 3. `use` declarations select an installed package version;
//! 4. every type reference is resolved to a primitive or a [`DeclId`]
//!    handle, and declarations are validated.
//!
//! All errors found along the way are returned together.
//!
//! [`DeclId`]: reproto_core::DeclId

mod error;
mod packages;
mod resolver;
mod validate;

pub use error::{ResolveError, ResolveWarning};
pub use packages::{Selection, select};
pub use resolver::resolve;

use reproto_core::{FileId, PackageName, Schema, Version, VersionScheme};
use reproto_parser::ast;

/// A parsed file and the package identity it defines.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub file: FileId,
    pub package: PackageName,
    pub version: Option<Version>,
    pub ast: ast::File,
}

#[derive(Debug, Clone)]
pub struct ResolveOptions {
    pub version_scheme: VersionScheme,
    /// Discriminator key for tagged interfaces without an explicit `tag`.
    pub default_tag: String,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            version_scheme: VersionScheme::default(),
            default_tag: "type".to_string(),
        }
    }
}

/// A successfully resolved schema plus non-fatal findings.
#[derive(Debug)]
pub struct Resolved {
    pub schema: Schema,
    pub warnings: Vec<ResolveWarning>,
}
