//! Output backends for code generation.
//!
//! Each backend takes the resolved [`Schema`](reproto_core::Schema) and
//! produces source files. All backends implement the
//! [`Backend`](crate::traits::Backend) trait for uniform access via the
//! registry.

// C#
#[cfg(feature = "backend-csharp")]
pub mod csharp;

#[cfg(feature = "backend-csharp")]
pub use csharp::{CSHARP_BACKEND, CSharpBackend};

// Swift
#[cfg(feature = "backend-swift")]
pub mod swift;

#[cfg(feature = "backend-swift")]
pub use swift::{SWIFT_BACKEND, SwiftBackend};

// JavaScript
#[cfg(feature = "backend-js")]
pub mod js;

#[cfg(feature = "backend-js")]
pub use js::{JS_BACKEND, JsBackend};
