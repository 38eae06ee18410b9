//! Indentation-aware text buffer shared by the backends.

use std::fmt::Write;

pub(crate) struct CodeWriter {
    output: String,
    indent: usize,
    unit: &'static str,
}

impl CodeWriter {
    /// A writer indenting by `unit` per level.
    pub fn new(unit: &'static str) -> Self {
        Self {
            output: String::new(),
            indent: 0,
            unit,
        }
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent {
            self.output.push_str(self.unit);
        }
    }

    /// Write one indented line.
    pub fn line(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref();
        if !text.is_empty() {
            self.write_indent();
            self.output.push_str(text);
        }
        self.output.push('\n');
    }

    /// Write an empty line, unless the previous line is already empty or opens a block.
    pub fn blank(&mut self) {
        if self.output.is_empty() || self.output.ends_with("\n\n") || self.output.ends_with("{\n")
        {
            return;
        }
        self.output.push('\n');
    }

    /// Write `header` and indent what follows.
    pub fn open(&mut self, header: impl AsRef<str>) {
        self.line(header);
        self.indent += 1;
    }

    /// Dedent and write `footer`.
    pub fn close(&mut self, footer: impl AsRef<str>) {
        self.indent = self.indent.saturating_sub(1);
        self.line(footer);
    }

    /// Write `text` one level out without changing the indentation, e.g. `} else {`.
    pub fn middle(&mut self, text: impl AsRef<str>) {
        self.indent = self.indent.saturating_sub(1);
        self.line(text);
        self.indent += 1;
    }

    /// Write each line of `doc` behind `prefix`.
    pub fn doc(&mut self, prefix: &str, doc: &[String]) {
        for line in doc {
            if line.is_empty() {
                self.line(prefix);
            } else {
                let mut text = String::new();
                write!(text, "{} {}", prefix, line).unwrap();
                self.line(text);
            }
        }
    }

    /// Append pre-rendered text, re-indented to the current level.
    pub fn embed(&mut self, text: &str) {
        for line in text.lines() {
            self.line(line);
        }
    }

    pub fn finish(self) -> String {
        self.output
    }
}

/// Quote `value` as a string literal in C-like languages.
pub(crate) fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => write!(out, "\\u{:04x}", c as u32).unwrap(),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
