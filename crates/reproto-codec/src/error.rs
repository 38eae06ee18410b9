use std::fmt;

/// A missing record field, by JSON name or tuple position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKey {
    Name(String),
    Index(usize),
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKey::Name(name) => write!(f, "{}", name),
            FieldKey::Index(index) => write!(f, "{}", index),
        }
    }
}

/// Why a JSON document does not match a declaration.
///
/// `path` locates the offending value, e.g. `$.items[2].name`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    #[error("{path}: missing field `{field}`")]
    MissingField { path: String, field: FieldKey },

    #[error("{path}: unknown variant {value}")]
    UnknownVariant { path: String, value: String },

    #[error("{path}: no member of `{decl}` has the value {value}")]
    NoMatchingValue {
        path: String,
        decl: String,
        value: String,
    },

    #[error("{path}: no sub-type of `{decl}` matches the fields present")]
    NoMatchingSubType { path: String, decl: String },

    #[error("{path}: expected {expected}, found {found}")]
    UnexpectedType {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("{path}: {value} is out of range for {ty}")]
    OutOfRange {
        path: String,
        value: String,
        ty: &'static str,
    },

    #[error("{path}: `{decl}` is a {kind} and has no JSON representation")]
    NotData {
        path: String,
        decl: String,
        kind: &'static str,
    },
}

/// Why a [`Value`](crate::Value) cannot be encoded.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EncodeError {
    #[error("{path}: required field `{field}` has no value")]
    MissingField { path: String, field: String },

    #[error("{path}: {message}")]
    Invalid { path: String, message: String },
}
