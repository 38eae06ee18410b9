//! Reserved words per target language.

use crate::casing::Casing;
use std::collections::HashSet;

/// A language whose reserved words must be escaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    CSharp,
    Swift,
    JavaScript,
}

/// How a reserved word is made into a legal identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escape {
    Prefix(&'static str),
    Suffix(&'static str),
}

impl Escape {
    pub fn apply(self, name: &str) -> String {
        match self {
            Escape::Prefix(prefix) => format!("{}{}", prefix, name),
            Escape::Suffix(suffix) => format!("{}{}", name, suffix),
        }
    }
}

const CSHARP: &[&str] = &[
    "abstract", "as", "base", "bool", "break", "byte", "case", "catch", "char", "checked", "class",
    "const", "continue", "decimal", "default", "delegate", "do", "double", "else", "enum", "event",
    "explicit", "extern", "false", "finally", "fixed", "float", "for", "foreach", "goto", "if",
    "implicit", "in", "int", "interface", "internal", "is", "lock", "long", "namespace", "new",
    "null", "object", "operator", "out", "override", "params", "private", "protected", "public",
    "readonly", "ref", "return", "sbyte", "sealed", "short", "sizeof", "stackalloc", "static",
    "string", "struct", "switch", "this", "throw", "true", "try", "typeof", "uint", "ulong",
    "unchecked", "unsafe", "ushort", "using", "virtual", "void", "volatile", "while",
];

const SWIFT: &[&str] = &[
    "Any", "Self", "as", "associatedtype", "break", "case", "catch", "class", "continue", "default",
    "defer", "deinit", "do", "else", "enum", "extension", "fallthrough", "false", "fileprivate",
    "for", "func", "guard", "if", "import", "in", "init", "inout", "internal", "is", "let", "nil",
    "open", "operator", "private", "protocol", "public", "repeat", "rethrows", "return", "self",
    "static", "struct", "subscript", "super", "switch", "throw", "throws", "true", "try",
    "typealias", "var", "where", "while",
];

const JAVASCRIPT: &[&str] = &[
    "arguments", "await", "break", "case", "catch", "class", "const", "continue", "debugger",
    "default", "delete", "do", "else", "enum", "eval", "export", "extends", "false", "finally",
    "for", "function", "if", "implements", "import", "in", "instanceof", "interface", "let", "new",
    "null", "package", "private", "protected", "public", "return", "static", "super", "switch",
    "this", "throw", "true", "try", "typeof", "var", "void", "while", "with", "yield",
];

impl Language {
    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            Language::CSharp => CSHARP,
            Language::Swift => SWIFT,
            Language::JavaScript => JAVASCRIPT,
        }
    }

    pub fn escape_style(self) -> Escape {
        match self {
            Language::CSharp | Language::JavaScript => Escape::Prefix("_"),
            Language::Swift => Escape::Suffix("_"),
        }
    }

    pub fn is_keyword(self, name: &str) -> bool {
        self.keywords().contains(&name)
    }
}

/// Escape `name` if it is reserved in `language`.
pub fn escape(name: &str, language: Language) -> String {
    if language.is_keyword(name) {
        language.escape_style().apply(name)
    } else {
        name.to_string()
    }
}

/// Case and escape a group of sibling names so that no two results collide.
///
/// Names keep their natural spelling where possible. When casing or escaping
/// makes two names equal, the later one is escaped again until it is unique.
pub fn escape_all<'a>(
    names: impl IntoIterator<Item = &'a str>,
    casing: Casing,
    language: Language,
) -> Vec<String> {
    let natural: Vec<String> = names
        .into_iter()
        .map(|name| {
            let cased = casing.apply(name);
            let cased = if cased.is_empty() { name.to_string() } else { cased };
            escape(&cased, language)
        })
        .collect();

    let style = language.escape_style();
    let mut taken = HashSet::new();
    let mut result = Vec::with_capacity(natural.len());
    for candidate in &natural {
        let mut name = candidate.clone();
        while taken.contains(&name) || (name != *candidate && natural.contains(&name)) {
            name = style.apply(&name);
        }
        taken.insert(name.clone());
        result.push(name);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_per_language() {
        assert_eq!(escape("as", Language::Swift), "as_");
        assert_eq!(escape("class", Language::Swift), "class_");
        assert_eq!(escape("explicit", Language::CSharp), "_explicit");
        assert_eq!(escape("for", Language::JavaScript), "_for");
        assert_eq!(escape("name", Language::JavaScript), "name");
    }

    #[test]
    fn test_escape_all_keeps_names_distinct() {
        let names = escape_all(["class", "_class", "for"], Casing::LowerSnake, Language::CSharp);
        // `_class` cases to `class`, which is reserved.
        assert_eq!(names, ["_class", "__class", "_for"]);
    }

    #[test]
    fn test_escape_all_casing_collision() {
        let names = escape_all(["foo_bar", "fooBar"], Casing::LowerCamel, Language::Swift);
        assert_eq!(names, ["fooBar", "fooBar_"]);
    }

    #[test]
    fn test_escape_never_steals_natural_name() {
        let names = escape_all(["as", "as_"], Casing::LowerSnake, Language::Swift);
        assert_eq!(names, ["as_", "as__"]);
    }

    #[test]
    fn test_escape_all_injective_over_keywords() {
        for language in [Language::CSharp, Language::Swift, Language::JavaScript] {
            let mut names: Vec<&str> = language.keywords().to_vec();
            names.extend(["value", "result", "json", "data"]);
            let escaped = escape_all(names.iter().copied(), Casing::LowerSnake, language);
            let unique: HashSet<&String> = escaped.iter().collect();
            assert_eq!(unique.len(), escaped.len(), "{:?}", language);
            for name in &escaped {
                assert!(!language.is_keyword(name), "{} is reserved", name);
            }
        }
    }
}
