//! Traits for code generation backends.

use crate::error::EmitError;
use reproto_core::{DeclId, DiscriminatorPlacement, PackageId, Schema};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Settings shared by every backend.
#[derive(Debug, Clone, Default)]
pub struct EmitOptions {
    pub discriminator_placement: DiscriminatorPlacement,
    /// Emit only these packages; empty means all of them.
    pub packages: Vec<PackageId>,
}

/// Everything a backend may read while emitting.
#[derive(Debug, Clone, Copy)]
pub struct Context<'a> {
    pub schema: &'a Schema,
    pub options: &'a EmitOptions,
}

/// Emitted source for one top-level declaration and everything nested in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub decl: DeclId,
    pub text: String,
    /// Backend-specific file prerequisites, e.g. C# `using` namespaces.
    pub requires: BTreeSet<String>,
    /// Other packages the fragment refers to.
    pub imports: BTreeSet<PackageId>,
}

impl Fragment {
    pub fn new(decl: DeclId) -> Self {
        Self {
            decl,
            text: String::new(),
            requires: BTreeSet::new(),
            imports: BTreeSet::new(),
        }
    }
}

/// A generated file, relative to the backend's output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub backend: &'static str,
    pub path: PathBuf,
    pub contents: String,
}

/// A code generation backend.
///
/// Backends turn resolved declarations into source text. Emission happens in
/// two steps so that declarations can be emitted in parallel:
///
/// 1. [`emit_decl`](Backend::emit_decl) renders one top-level declaration;
/// 2. fragments that map to the same [`path`](Backend::path) are handed to
///    [`assemble`](Backend::assemble) in declaration order.
///
/// A backend that cannot express a construct returns
/// [`EmitError::Unsupported`]; only that declaration is skipped.
pub trait Backend: Send + Sync {
    /// Unique backend identifier (e.g., "csharp", "swift", "js").
    fn name(&self) -> &'static str;

    /// Target language (e.g., "C#", "Swift", "JavaScript").
    fn language(&self) -> &'static str;

    /// File extension for generated code (e.g., "cs", "swift", "js").
    fn extension(&self) -> &'static str;

    /// Output path of the file holding `decl`, a top-level declaration.
    fn path(&self, cx: &Context<'_>, decl: DeclId) -> PathBuf;

    /// Render one top-level declaration.
    fn emit_decl(&self, cx: &Context<'_>, decl: DeclId) -> Result<Fragment, EmitError>;

    /// Join the fragments of one file.
    fn assemble(&self, cx: &Context<'_>, path: &Path, fragments: &[Fragment]) -> String;
}
