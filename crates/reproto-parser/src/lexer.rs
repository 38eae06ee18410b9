//! Tokens of the reproto schema language.

use logos::{Filter, Logos};

pub const KEYWORDS: &[&str] = &[
    "any", "as", "boolean", "bytes", "datetime", "double", "enum", "false", "float", "i32", "i64",
    "interface", "service", "stream", "string", "true", "tuple", "type", "u32", "u64", "use",
];

pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.iter().any(|keyword| word == *keyword)
}

#[derive(Clone, Debug, PartialEq, Logos)]
pub enum Token<'source> {
    #[regex(r"[a-z_][a-zA-Z0-9_]*")]
    Ident(&'source str),
    #[regex(r"[A-Z][a-zA-Z0-9_]*")]
    TypeIdent(&'source str),
    #[token("\"", string_literal)]
    String(StringLiteral),
    #[regex(r"-?[0-9][0-9a-zA-Z_]*(\.[0-9a-zA-Z_]*)?([+-][0-9a-zA-Z_]+)?")]
    Number(&'source str),
    #[regex(r"//[^\n]*", line_comment)]
    Doc(DocComment<'source>),

    #[token("any")]
    KeywordAny,
    #[token("as")]
    KeywordAs,
    #[token("boolean")]
    KeywordBoolean,
    #[token("bytes")]
    KeywordBytes,
    #[token("datetime")]
    KeywordDateTime,
    #[token("double")]
    KeywordDouble,
    #[token("enum")]
    KeywordEnum,
    #[token("false")]
    KeywordFalse,
    #[token("float")]
    KeywordFloat,
    #[token("i32")]
    KeywordI32,
    #[token("i64")]
    KeywordI64,
    #[token("interface")]
    KeywordInterface,
    #[token("service")]
    KeywordService,
    #[token("stream")]
    KeywordStream,
    #[token("string")]
    KeywordString,
    #[token("true")]
    KeywordTrue,
    #[token("tuple")]
    KeywordTuple,
    #[token("type")]
    KeywordType,
    #[token("u32")]
    KeywordU32,
    #[token("u64")]
    KeywordU64,
    #[token("use")]
    KeywordUse,

    #[token(":")]
    Colon,
    #[token("::")]
    ColonColon,
    #[token(",")]
    Comma,
    #[token("=")]
    Equals,
    #[token(".")]
    FullStop,
    #[token("#")]
    Hash,
    #[token("->")]
    HyphenGreater,
    #[token("?")]
    Question,
    #[token(";")]
    Semicolon,
    #[token("{")]
    OpenBrace,
    #[token("}")]
    CloseBrace,
    #[token("[")]
    OpenBracket,
    #[token("]")]
    CloseBracket,
    #[token("(")]
    OpenParen,
    #[token(")")]
    CloseParen,

    #[error]
    #[regex(r"[ \t\r\n\f]+", logos::skip)]
    Error,
}

impl Token<'_> {
    /// Human-readable description used in error messages.
    pub fn description(&self) -> String {
        match self {
            Token::Ident(name) | Token::TypeIdent(name) => format!("identifier `{}`", name),
            Token::String(_) => "string literal".to_string(),
            Token::Number(text) => format!("number `{}`", text),
            Token::Doc(_) => "doc comment".to_string(),
            Token::Error => "invalid character".to_string(),
            other => match other.keyword() {
                Some(keyword) => format!("keyword `{}`", keyword),
                None => format!("`{}`", other.punctuation()),
            },
        }
    }

    pub fn keyword(&self) -> Option<&'static str> {
        Some(match self {
            Token::KeywordAny => "any",
            Token::KeywordAs => "as",
            Token::KeywordBoolean => "boolean",
            Token::KeywordBytes => "bytes",
            Token::KeywordDateTime => "datetime",
            Token::KeywordDouble => "double",
            Token::KeywordEnum => "enum",
            Token::KeywordFalse => "false",
            Token::KeywordFloat => "float",
            Token::KeywordI32 => "i32",
            Token::KeywordI64 => "i64",
            Token::KeywordInterface => "interface",
            Token::KeywordService => "service",
            Token::KeywordStream => "stream",
            Token::KeywordString => "string",
            Token::KeywordTrue => "true",
            Token::KeywordTuple => "tuple",
            Token::KeywordType => "type",
            Token::KeywordU32 => "u32",
            Token::KeywordU64 => "u64",
            Token::KeywordUse => "use",
            _ => return None,
        })
    }

    fn punctuation(&self) -> &'static str {
        match self {
            Token::Colon => ":",
            Token::ColonColon => "::",
            Token::Comma => ",",
            Token::Equals => "=",
            Token::FullStop => ".",
            Token::Hash => "#",
            Token::HyphenGreater => "->",
            Token::Question => "?",
            Token::Semicolon => ";",
            Token::OpenBrace => "{",
            Token::CloseBrace => "}",
            Token::OpenBracket => "[",
            Token::CloseBracket => "]",
            Token::OpenParen => "(",
            Token::CloseParen => ")",
            _ => "?",
        }
    }
}

/// A `///` or `//!` comment. Plain `//` comments never become tokens.
#[derive(Clone, Debug, PartialEq)]
pub enum DocComment<'source> {
    Item(&'source str),
    Package(&'source str),
}

fn line_comment<'source>(
    lexer: &mut logos::Lexer<'source, Token<'source>>,
) -> Filter<DocComment<'source>> {
    let slice = lexer.slice();
    if let Some(text) = slice.strip_prefix("///") {
        Filter::Emit(DocComment::Item(doc_text(text)))
    } else if let Some(text) = slice.strip_prefix("//!") {
        Filter::Emit(DocComment::Package(doc_text(text)))
    } else {
        Filter::Skip
    }
}

fn doc_text(text: &str) -> &str {
    let text = text.strip_suffix('\r').unwrap_or(text);
    text.strip_prefix(' ').unwrap_or(text)
}

/// A string literal with its escapes already decoded.
#[derive(Clone, Debug, PartialEq)]
pub enum StringLiteral {
    Ok(String),
    /// No closing quote before the end of the line.
    Unterminated,
    /// Byte range, relative to the opening quote, of the first bad escape.
    InvalidEscape(usize, usize),
}

fn string_literal<'source>(lexer: &mut logos::Lexer<'source, Token<'source>>) -> StringLiteral {
    let remainder = lexer.remainder();
    let mut value = String::new();
    let mut invalid = None;
    let mut chars = remainder.char_indices().peekable();

    while let Some((at, c)) = chars.next() {
        match c {
            '"' => {
                lexer.bump(at + 1);
                return match invalid {
                    Some((start, end)) => StringLiteral::InvalidEscape(start + 1, end + 1),
                    None => StringLiteral::Ok(value),
                };
            }
            '\n' => break,
            '\\' => {
                let escape = remainder[at + 1..].chars().next();
                let (decoded, len) = match escape {
                    Some('n') => (Some('\n'), 1),
                    Some('r') => (Some('\r'), 1),
                    Some('t') => (Some('\t'), 1),
                    Some('0') => (Some('\0'), 1),
                    Some('\'') => (Some('\''), 1),
                    Some('"') => (Some('"'), 1),
                    Some('\\') => (Some('\\'), 1),
                    Some('x') => hex_escape(&remainder[at + 2..]),
                    Some('u') => unicode_escape(&remainder[at + 2..]),
                    Some('\n') | None => (None, 0),
                    Some(other) => (None, other.len_utf8()),
                };
                match decoded {
                    Some(c) => value.push(c),
                    None if invalid.is_none() => invalid = Some((at, at + 1 + len)),
                    None => {}
                }
                // Skip the escape body; the loop continues after it.
                let end = at + 1 + len;
                while chars.peek().is_some_and(|&(next, _)| next < end) {
                    chars.next();
                }
            }
            c => value.push(c),
        }
    }

    let line_end = remainder.find('\n').unwrap_or(remainder.len());
    lexer.bump(line_end);
    StringLiteral::Unterminated
}

/// `\xHH`, returning the decoded char and the escape length after the backslash.
fn hex_escape(rest: &str) -> (Option<char>, usize) {
    let digits: String = rest.chars().take(2).collect();
    if digits.len() == 2 && digits.chars().all(|c| c.is_ascii_hexdigit()) {
        let decoded = u32::from_str_radix(&digits, 16).ok().and_then(char::from_u32);
        (decoded, 3)
    } else {
        (None, 1)
    }
}

/// `\u{H..}` with one to six hex digits.
fn unicode_escape(rest: &str) -> (Option<char>, usize) {
    let Some(body) = rest.strip_prefix('{') else {
        return (None, 1);
    };
    let Some(close) = body.find('}') else {
        return (None, 1);
    };
    let digits = &body[..close];
    let len = 1 + 1 + close + 1;
    if digits.is_empty() || digits.len() > 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return (None, len);
    }
    let decoded = u32::from_str_radix(digits, 16).ok().and_then(char::from_u32);
    (decoded, len)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(source: &str) -> Vec<Token<'_>> {
        Token::lexer(source).collect()
    }

    #[test]
    fn test_keywords_and_identifiers() {
        assert_eq!(
            tokens("type Foo { field?: string; }"),
            vec![
                Token::KeywordType,
                Token::TypeIdent("Foo"),
                Token::OpenBrace,
                Token::Ident("field"),
                Token::Question,
                Token::Colon,
                Token::KeywordString,
                Token::Semicolon,
                Token::CloseBrace,
            ]
        );
        assert_eq!(tokens("typed"), vec![Token::Ident("typed")]);
    }

    #[test]
    fn test_comments() {
        assert_eq!(
            tokens("//! package\n// plain\n/// item docs\nFoo"),
            vec![
                Token::Doc(DocComment::Package("package")),
                Token::Doc(DocComment::Item("item docs")),
                Token::TypeIdent("Foo"),
            ]
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            tokens(r#""a\n\"b\" \x41 \u{1F600}""#),
            vec![Token::String(StringLiteral::Ok(
                "a\n\"b\" A \u{1F600}".to_string()
            ))]
        );
    }

    #[test]
    fn test_unterminated_string() {
        assert_eq!(
            tokens("\"abc\nFoo"),
            vec![
                Token::String(StringLiteral::Unterminated),
                Token::TypeIdent("Foo"),
            ]
        );
    }

    #[test]
    fn test_invalid_escape() {
        assert_eq!(
            tokens(r#""a\qb""#),
            vec![Token::String(StringLiteral::InvalidEscape(2, 4))]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            tokens("42 -1 1.5 2e-3 1."),
            vec![
                Token::Number("42"),
                Token::Number("-1"),
                Token::Number("1.5"),
                Token::Number("2e-3"),
                Token::Number("1."),
            ]
        );
    }

    #[test]
    fn test_punctuation() {
        assert_eq!(
            tokens("a::B -> #[x]"),
            vec![
                Token::Ident("a"),
                Token::ColonColon,
                Token::TypeIdent("B"),
                Token::HyphenGreater,
                Token::Hash,
                Token::OpenBracket,
                Token::Ident("x"),
                Token::CloseBracket,
            ]
        );
    }
}
