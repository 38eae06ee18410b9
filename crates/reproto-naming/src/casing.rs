//! Casing strategies.

use heck::{ToLowerCamelCase, ToShoutySnakeCase, ToSnakeCase, ToUpperCamelCase};
use serde::Deserialize;

/// Target casing for an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Casing {
    /// `lower_snake`
    LowerSnake,
    /// `lowerCamel`
    LowerCamel,
    /// `UpperCamel`
    UpperCamel,
    /// `UPPER_SNAKE`
    UpperSnake,
}

impl Casing {
    /// Render `name` in this casing.
    ///
    /// Applying the same casing to its own output returns it unchanged.
    pub fn apply(self, name: &str) -> String {
        match self {
            Casing::LowerSnake => name.to_snake_case(),
            Casing::UpperSnake => name.to_shouty_snake_case(),
            // Camel output carries no separators, so word boundaries must be
            // recoverable from case alone.
            Casing::LowerCamel => words(name).join("_").to_lower_camel_case(),
            Casing::UpperCamel => words(name).join("_").to_upper_camel_case(),
        }
    }

    pub fn parse(name: &str) -> Option<Casing> {
        match name {
            "lower_snake" => Some(Casing::LowerSnake),
            "lower_camel" => Some(Casing::LowerCamel),
            "upper_camel" => Some(Casing::UpperCamel),
            "upper_snake" => Some(Casing::UpperSnake),
            _ => None,
        }
    }
}

/// Split an identifier into lowercase words.
///
/// Words are separated by `_` and start at every uppercase letter, so
/// acronyms split into single letters: `HTTPServer` is `h t t p server`.
/// `SCREAMING_SNAKE` names split on underscores only. Digits stay attached to
/// the word before them.
pub fn words(name: &str) -> Vec<String> {
    let screaming = name.contains('_') && !name.chars().any(|c| c.is_ascii_lowercase());
    let mut words = Vec::new();
    let mut current = String::new();
    for c in name.chars() {
        if c == '_' || !c.is_ascii_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if c.is_ascii_uppercase() && !screaming && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        current.push(c.to_ascii_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Casing; 4] = [
        Casing::LowerSnake,
        Casing::LowerCamel,
        Casing::UpperCamel,
        Casing::UpperSnake,
    ];

    const SAMPLES: &[&str] = &[
        "foo",
        "foo_bar",
        "fooBar",
        "FooBar",
        "FOO_BAR",
        "a_b_c",
        "HTTPServer",
        "enum_u32",
        "EnumU32",
        "tuple1",
        "x",
        "_leading",
        "trailing_",
        "double__underscore",
        "mixed_Case_words",
    ];

    #[test]
    fn test_words() {
        assert_eq!(words("fooBar_baz"), ["foo", "bar", "baz"]);
        assert_eq!(words("HTTPServer"), ["h", "t", "t", "p", "server"]);
        assert_eq!(words("enumU32"), ["enum", "u32"]);
        assert_eq!(words("FOO_BAR"), ["foo", "bar"]);
        assert!(words("__").is_empty());
    }

    #[test]
    fn test_casings() {
        assert_eq!(Casing::LowerSnake.apply("fooBar"), "foo_bar");
        assert_eq!(Casing::LowerCamel.apply("shared_ignore"), "sharedIgnore");
        assert_eq!(Casing::LowerCamel.apply("enum_u32"), "enumU32");
        assert_eq!(Casing::UpperCamel.apply("foo_bar"), "FooBar");
        assert_eq!(Casing::UpperCamel.apply("EnumU32"), "EnumU32");
        assert_eq!(Casing::UpperCamel.apply("HTTPServer"), "HTTPServer");
        assert_eq!(Casing::UpperCamel.apply("FOO_BAR"), "FooBar");
        assert_eq!(Casing::LowerSnake.apply("HTTPServer"), "http_server");
        assert_eq!(Casing::UpperSnake.apply("fooBar"), "FOO_BAR");
    }

    #[test]
    fn test_idempotent() {
        for casing in ALL {
            for sample in SAMPLES {
                let once = casing.apply(sample);
                let twice = casing.apply(&once);
                assert_eq!(once, twice, "{:?} is not idempotent on {}", casing, sample);
            }
        }
    }

    #[test]
    fn test_parse() {
        for casing in ALL {
            let name = match casing {
                Casing::LowerSnake => "lower_snake",
                Casing::LowerCamel => "lower_camel",
                Casing::UpperCamel => "upper_camel",
                Casing::UpperSnake => "upper_snake",
            };
            assert_eq!(Casing::parse(name), Some(casing));
        }
        assert_eq!(Casing::parse("kebab"), None);
    }
}
