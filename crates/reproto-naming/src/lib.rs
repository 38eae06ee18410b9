//! Identifier casing and keyword escaping.
//!
//! Every emitted identifier goes through two steps: a [`Casing`] turns the
//! schema name into the target's convention, then the target [`Language`]'s
//! keyword table escapes reserved words.
//!
//! ```
//! use reproto_naming::{Casing, Language, escape};
//!
//! assert_eq!(Casing::LowerCamel.apply("shared_ignore"), "sharedIgnore");
//! assert_eq!(escape("as", Language::Swift), "as_");
//! assert_eq!(escape("class", Language::CSharp), "_class");
//! ```

mod casing;
mod keywords;

pub use casing::{Casing, words};
pub use keywords::{Escape, Language, escape, escape_all};
