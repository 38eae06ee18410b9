//! Target code generation for resolved reproto schemas.
//!
//! # Architecture
//!
//! ```text
//!  resolved Schema            per declaration               per file
//! ─────────────────     ──────────────────────────     ─────────────────
//!                   ┌─> CSharpBackend::emit_decl ─┐
//! roots of each ────┼─> SwiftBackend::emit_decl  ─┼─> group by path ─> assemble
//! selected package  └─> JsBackend::emit_decl     ─┘   (BTreeMap)
//! ```
//!
//! Declarations are emitted in parallel with `rayon`. A backend that cannot
//! express a construct reports [`EmitError::Unsupported`] and skips only that
//! declaration; every other backend and declaration is unaffected.
//!
//! # Using the Backend Registry
//!
//! ```ignore
//! use reproto_codegen::{EmitOptions, backends, emit};
//!
//! let emitted = emit(&schema, &backends(), &EmitOptions::default());
//! for file in &emitted.files {
//!     println!("{}/{}", file.backend, file.path.display());
//! }
//! ```
//!
//! # Feature Flags
//!
//! Backend flags (use `backend-*` prefix):
//! - `backend-csharp` - C# classes with Newtonsoft.Json attributes
//! - `backend-swift` - Swift structs and enums with decode/encode extensions
//! - `backend-js` - ES module classes with decode/encode methods
//!
//! Language umbrella flags: `csharp`, `swift`, `js`.

mod common;
mod emit;
pub mod error;
pub mod output;
pub mod registry;
pub mod traits;
mod writer;

pub use emit::{Emitted, emit};
pub use error::EmitError;
pub use registry::{backend_names, backends, get_backend, register_backend};
pub use traits::{Backend, Context, EmitOptions, Fragment, OutputFile};
