//! Parse errors.

use codespan_reporting::diagnostic::{Diagnostic, Label};
use reproto_core::{FileId, NumberError, Span};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("unterminated string literal")]
    UnterminatedString { span: Span },
    #[error("invalid escape sequence `{sequence}`")]
    InvalidEscape { sequence: String, span: Span },
    #[error("unexpected character `{character}`")]
    UnexpectedCharacter { character: String, span: Span },
    #[error("{error}")]
    InvalidNumber { error: NumberError, span: Span },
    #[error("unknown keyword `{word}`, expected {expected}")]
    UnknownKeyword {
        word: String,
        expected: &'static str,
        span: Span,
    },
    #[error("unexpected {found}, expected {expected}")]
    UnexpectedToken {
        found: String,
        expected: &'static str,
        span: Span,
    },
    #[error("unexpected end of file, expected {expected}")]
    UnexpectedEof { expected: &'static str, span: Span },
    #[error("nesting is deeper than {limit} levels")]
    NestedTooDeep { limit: usize, span: Span },
}

impl ParseError {
    pub fn span(&self) -> Span {
        match self {
            ParseError::UnterminatedString { span }
            | ParseError::InvalidEscape { span, .. }
            | ParseError::UnexpectedCharacter { span, .. }
            | ParseError::InvalidNumber { span, .. }
            | ParseError::UnknownKeyword { span, .. }
            | ParseError::UnexpectedToken { span, .. }
            | ParseError::UnexpectedEof { span, .. }
            | ParseError::NestedTooDeep { span, .. } => *span,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic<FileId> {
        let span = self.span();
        let label = match self {
            ParseError::UnterminatedString { .. } => "missing closing quote",
            ParseError::InvalidEscape { .. } => "invalid escape",
            ParseError::UnexpectedCharacter { .. } => "unexpected character",
            ParseError::InvalidNumber { .. } => "invalid number",
            ParseError::UnknownKeyword { .. } => "unknown keyword",
            ParseError::UnexpectedToken { .. } => "unexpected token",
            ParseError::UnexpectedEof { .. } => "unexpected end of file",
            ParseError::NestedTooDeep { .. } => "nested too deeply",
        };
        Diagnostic::error()
            .with_message(self.to_string())
            .with_labels(vec![Label::primary(span.file, span.range()).with_message(label)])
    }
}
