//! Reference JSON codec for resolved reproto schemas.
//!
//! The generated code of every backend follows the rules implemented here:
//!
//! - types decode from objects; a missing or `null` required field is an error,
//!   an absent optional field decodes to nothing, unknown keys are ignored;
//! - tuples decode from arrays by position; trailing elements are ignored;
//! - tagged interfaces dispatch on the discriminator literal, untagged ones on
//!   the first sub-type whose required keys are all present;
//! - enums match their serialized values in declaration order.
//!
//! ```ignore
//! use reproto_codec::{Codec, CodecOptions};
//!
//! let codec = Codec::new(&schema, CodecOptions::default());
//! let value = codec.decode(foo, &serde_json::json!({"field": "hi"}))?;
//! assert_eq!(codec.encode(&value)?, serde_json::json!({"field": "hi"}));
//! ```

mod decode;
mod encode;
mod error;
mod value;

pub use error::{DecodeError, EncodeError, FieldKey};
pub use value::Value;

use reproto_core::{DeclId, DiscriminatorPlacement, Schema};

#[derive(Debug, Clone, Copy, Default)]
pub struct CodecOptions {
    /// Where encoded tagged interfaces put the discriminator.
    pub discriminator_placement: DiscriminatorPlacement,
}

/// Decodes and encodes JSON against the declarations of a schema.
#[derive(Debug, Clone, Copy)]
pub struct Codec<'a> {
    schema: &'a Schema,
    options: CodecOptions,
}

impl<'a> Codec<'a> {
    pub fn new(schema: &'a Schema, options: CodecOptions) -> Self {
        Self { schema, options }
    }

    pub fn schema(&self) -> &'a Schema {
        self.schema
    }

    /// `package::Outer::Inner` style name for messages.
    fn describe(&self, id: DeclId) -> String {
        format!(
            "{}::{}",
            self.schema.package(id.package).identity(),
            self.schema.decl_path(id).join("::")
        )
    }
}
