//! Resolution errors and warnings.

use codespan_reporting::diagnostic::{Diagnostic, Label};
use reproto_core::{FileId, NamespaceError, Span};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResolveError {
    #[error("package `{package}` is defined more than once")]
    DuplicatePackage { package: String, span: Span },
    #[error("invalid version range `{range}`: {message}")]
    InvalidVersionRange {
        range: String,
        message: String,
        span: Span,
    },
    #[error("no installed package matches `{package}`")]
    UnresolvedPackage { package: String, span: Span },
    #[error("`{package}` is ambiguous, installed versions: {}", .candidates.join(", "))]
    AmbiguousVersion {
        package: String,
        candidates: Vec<String>,
        span: Span,
    },
    #[error("import `{alias}` is defined more than once")]
    DuplicateImport {
        alias: String,
        span: Span,
        previous: Span,
    },
    #[error("cannot find `{name}` in this scope")]
    UnresolvedReference { name: String, span: Span },
    #[error("{what} `{name}` is defined more than once")]
    DuplicateName {
        what: &'static str,
        name: String,
        span: Span,
        previous: Span,
    },
    #[error("JSON name `{name}` is used by more than one field")]
    DuplicateJsonName {
        name: String,
        span: Span,
        previous: Span,
    },
    #[error("enum value {value} is used by more than one member")]
    DuplicateEnumValue {
        value: String,
        span: Span,
        previous: Span,
    },
    #[error("enums must be `string`, `u32`, `u64`, `i32` or `i64`, found {found}")]
    InvalidEnumType { found: String, span: Span },
    #[error("invalid value for enum member `{member}`: {message}")]
    InvalidEnumValue {
        member: String,
        message: String,
        span: Span,
    },
    #[error("sub-type literal `{literal}` is used more than once")]
    DuplicateDiscriminator {
        literal: String,
        span: Span,
        previous: Span,
    },
    #[error("sub-type literals must be strings, found {found}")]
    InvalidDiscriminator { found: &'static str, span: Span },
    #[error("discriminator `{tag}` conflicts with field `{field}`")]
    TagConflict {
        tag: String,
        field: String,
        span: Span,
    },
    #[error("unknown attribute `{name}`")]
    UnknownAttribute { name: String, span: Span },
    #[error("{message}")]
    InvalidAttribute { message: String, span: Span },
    #[error("sub-type `{sub_type}` does not have a unique set of required fields, it matches `{other}`")]
    UntaggedAmbiguous {
        sub_type: String,
        other: String,
        span: Span,
    },
    #[error("sub-type `{sub_type}` would always match before `{later}`, declare it after `{later}`")]
    UntaggedOrdering {
        sub_type: String,
        later: String,
        span: Span,
    },
    #[error("field `{field}` of `{sub_type}` is optional but required in `{other}`")]
    UntaggedOptional {
        sub_type: String,
        field: String,
        other: String,
        span: Span,
    },
    #[error("tuple field `{field}` cannot be optional")]
    OptionalTupleField { field: String, span: Span },
    #[error("map keys must be `string` or an integer type, found {found}")]
    InvalidMapKey { found: String, span: Span },
    #[error(transparent)]
    Namespace(#[from] NamespaceError),
}

impl ResolveError {
    pub fn span(&self) -> Option<Span> {
        use ResolveError::*;
        match self {
            DuplicatePackage { span, .. }
            | InvalidVersionRange { span, .. }
            | UnresolvedPackage { span, .. }
            | AmbiguousVersion { span, .. }
            | DuplicateImport { span, .. }
            | UnresolvedReference { span, .. }
            | DuplicateName { span, .. }
            | DuplicateJsonName { span, .. }
            | DuplicateEnumValue { span, .. }
            | InvalidEnumType { span, .. }
            | InvalidEnumValue { span, .. }
            | DuplicateDiscriminator { span, .. }
            | InvalidDiscriminator { span, .. }
            | TagConflict { span, .. }
            | UnknownAttribute { span, .. }
            | InvalidAttribute { span, .. }
            | UntaggedAmbiguous { span, .. }
            | UntaggedOrdering { span, .. }
            | UntaggedOptional { span, .. }
            | OptionalTupleField { span, .. }
            | InvalidMapKey { span, .. } => Some(*span),
            Namespace(_) => None,
        }
    }

    fn previous(&self) -> Option<Span> {
        match self {
            ResolveError::DuplicateImport { previous, .. }
            | ResolveError::DuplicateName { previous, .. }
            | ResolveError::DuplicateJsonName { previous, .. }
            | ResolveError::DuplicateEnumValue { previous, .. }
            | ResolveError::DuplicateDiscriminator { previous, .. } => Some(*previous),
            _ => None,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic<FileId> {
        if let ResolveError::Namespace(error) = self {
            return error.to_diagnostic();
        }
        let mut labels = Vec::new();
        if let Some(span) = self.span() {
            labels.push(Label::primary(span.file, span.range()));
        }
        if let Some(previous) = self.previous() {
            labels.push(
                Label::secondary(previous.file, previous.range()).with_message("first defined here"),
            );
        }
        Diagnostic::error()
            .with_message(self.to_string())
            .with_labels(labels)
    }
}

/// Problems that do not stop compilation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResolveWarning {
    #[error("required fields form a cycle ({}), no value of `{}` can be constructed", .path.join(" -> "), .path[0])]
    RequiredCycle { path: Vec<String>, span: Span },
}

impl ResolveWarning {
    pub fn to_diagnostic(&self) -> Diagnostic<FileId> {
        match self {
            ResolveWarning::RequiredCycle { span, .. } => Diagnostic::warning()
                .with_message(self.to_string())
                .with_labels(vec![Label::primary(span.file, span.range())])
                .with_notes(vec![
                    "make one of the fields optional, or hold it in an array or map".to_string(),
                ]),
        }
    }
}
