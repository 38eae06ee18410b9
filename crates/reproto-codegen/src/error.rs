//! Emission errors.

use codespan_reporting::diagnostic::{Diagnostic, Label};
use reproto_core::{FileId, Span};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EmitError {
    /// The target cannot represent a construct; the declaration is skipped.
    #[error("{backend}: {feature} is not supported (in `{decl}`)")]
    Unsupported {
        backend: &'static str,
        decl: String,
        feature: String,
        span: Span,
    },
}

impl EmitError {
    pub fn unsupported(
        backend: &'static str,
        decl: impl Into<String>,
        feature: impl Into<String>,
        span: Span,
    ) -> Self {
        EmitError::Unsupported {
            backend,
            decl: decl.into(),
            feature: feature.into(),
            span,
        }
    }

    pub fn backend(&self) -> &'static str {
        match self {
            EmitError::Unsupported { backend, .. } => backend,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic<FileId> {
        match self {
            EmitError::Unsupported { backend, span, .. } => Diagnostic::error()
                .with_message(self.to_string())
                .with_labels(vec![Label::primary(span.file, span.range())])
                .with_notes(vec![format!(
                    "no `{}` output is written for this declaration",
                    backend
                )]),
        }
    }
}
