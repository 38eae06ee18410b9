//! Batched diagnostics.
//!
//! Every compile stage reports problems as codespan diagnostics so the whole
//! run can be rendered at once instead of stopping at the first error.

use crate::source::{FileId, Sources};
use codespan_reporting::diagnostic::{Diagnostic, Severity};
use codespan_reporting::term::{self, termcolor::WriteColor};

/// An ordered list of diagnostics collected during a run.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    items: Vec<Diagnostic<FileId>>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic<FileId>) {
        self.items.push(diagnostic);
    }

    pub fn extend(&mut self, other: impl IntoIterator<Item = Diagnostic<FileId>>) {
        self.items.extend(other);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic<FileId>> {
        self.items.iter()
    }

    /// Number of diagnostics at `Error` or `Bug` severity.
    pub fn error_count(&self) -> usize {
        self.items
            .iter()
            .filter(|d| matches!(d.severity, Severity::Error | Severity::Bug))
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// Render all diagnostics to a terminal writer.
    pub fn emit(
        &self,
        writer: &mut dyn WriteColor,
        sources: &Sources,
    ) -> Result<(), codespan_reporting::files::Error> {
        let config = term::Config::default();
        for diagnostic in &self.items {
            term::emit(writer, &config, sources.files(), diagnostic)?;
        }
        Ok(())
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic<FileId>;
    type IntoIter = std::vec::IntoIter<Diagnostic<FileId>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl FromIterator<Diagnostic<FileId>> for Diagnostics {
    fn from_iter<I: IntoIterator<Item = Diagnostic<FileId>>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codespan_reporting::term::termcolor::NoColor;

    #[test]
    fn test_error_count_ignores_warnings() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.push(Diagnostic::warning().with_message("cycle"));
        diagnostics.push(Diagnostic::error().with_message("broken"));
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics.error_count(), 1);
    }

    #[test]
    fn test_emit_renders_messages() {
        let mut sources = Sources::new();
        sources.add("a.reproto", "type A {}");
        let diagnostics: Diagnostics = vec![Diagnostic::error().with_message("nope")]
            .into_iter()
            .collect();

        let mut out = NoColor::new(Vec::new());
        diagnostics.emit(&mut out, &sources).unwrap();
        let text = String::from_utf8(out.into_inner()).unwrap();
        assert!(text.contains("error: nope"));
    }
}
