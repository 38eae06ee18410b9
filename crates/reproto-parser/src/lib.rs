//! Lexer and parser for `.reproto` schema files.
//!
//! ```
//! use reproto_parser::{ast, parse};
//!
//! let (file, errors) = parse(0, "type Foo { field: string; }");
//! assert!(errors.is_empty());
//! assert_eq!(file.decls[0].name.value, "Foo");
//! assert!(matches!(file.decls[0].kind, ast::DeclKind::Type(_)));
//! ```
//!
//! Parsing never stops at the first error: the parser recovers at the next
//! declaration boundary and keeps going, so one call can report several
//! [`ParseError`]s alongside a partial tree.

pub mod ast;
mod error;
pub mod lexer;
mod parser;

pub use error::ParseError;
pub use parser::{MAX_NESTING, parse};
