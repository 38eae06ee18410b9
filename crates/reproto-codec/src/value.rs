//! Decoded values.

use reproto_core::DeclId;

/// A JSON document decoded against a declaration.
///
/// Records keep one slot per field in declaration order, so two values decoded
/// from differently ordered JSON objects compare equal.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Boolean(bool),
    /// `string`, `datetime` and `bytes` values.
    String(String),
    Integer(i128),
    Float(f64),
    /// An `any` value, kept as is.
    Any(serde_json::Value),
    Array(Vec<Value>),
    /// Entries in document order; keys are `String` or `Integer` values.
    Map(Vec<(Value, Value)>),
    /// An inline tuple.
    Tuple(Vec<Value>),
    /// A type, a tuple declaration or an interface sub-type.
    Record {
        decl: DeclId,
        /// Index of the sub-type for interfaces.
        sub_type: Option<usize>,
        /// `None` for absent optional fields.
        fields: Vec<Option<Value>>,
    },
    Enum {
        decl: DeclId,
        member: usize,
    },
}

impl Value {
    /// Field slots of a record.
    pub fn fields(&self) -> Option<&[Option<Value>]> {
        match self {
            Value::Record { fields, .. } => Some(fields),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(value) => Some(value),
            _ => None,
        }
    }
}
