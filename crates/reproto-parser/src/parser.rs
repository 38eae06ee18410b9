//! Recursive-descent parser over the token stream.

use crate::ast::*;
use crate::error::ParseError;
use crate::lexer::{DocComment, StringLiteral, Token, is_keyword};
use logos::Logos;
use reproto_core::{FileId, Number, PackageName, Primitive, Span, Spanned};

const DECL_EXPECTED: &str = "one of `type`, `tuple`, `interface`, `enum`, `service`";

/// Deepest nesting of types or declarations before parsing gives up.
pub const MAX_NESTING: usize = 64;

/// A token with the `///` comments that preceded it.
struct Lexeme<'s> {
    token: Token<'s>,
    span: Span,
    doc: Vec<String>,
}

/// Parse one file, returning the (possibly partial) tree and every error found.
pub fn parse(file: FileId, source: &str) -> (File, Vec<ParseError>) {
    let mut errors = Vec::new();
    let mut package_doc = Vec::new();
    let tokens = tokenize(file, source, &mut package_doc, &mut errors);

    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
        nesting: 0,
        last: Span::new(file, 0..0),
        eof: Span::new(file, source.len()..source.len()),
        errors,
    };
    let mut tree = parser.file();
    tree.doc = package_doc;
    (tree, parser.errors)
}

fn tokenize<'s>(
    file: FileId,
    source: &'s str,
    package_doc: &mut Vec<String>,
    errors: &mut Vec<ParseError>,
) -> Vec<Lexeme<'s>> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();
    let mut doc = Vec::new();

    while let Some(token) = lexer.next() {
        let span = Span::new(file, lexer.span());
        let token = match token {
            Token::Doc(DocComment::Item(text)) => {
                doc.push(text.to_string());
                continue;
            }
            Token::Doc(DocComment::Package(text)) => {
                package_doc.push(text.to_string());
                continue;
            }
            Token::Error => {
                errors.push(ParseError::UnexpectedCharacter {
                    character: lexer.slice().to_string(),
                    span,
                });
                continue;
            }
            // Keep a placeholder so the parser does not cascade.
            Token::String(StringLiteral::Unterminated) => {
                errors.push(ParseError::UnterminatedString { span });
                Token::String(StringLiteral::Ok(String::new()))
            }
            Token::String(StringLiteral::InvalidEscape(start, end)) => {
                let escape = Span::new(file, span.start + start..span.start + end);
                errors.push(ParseError::InvalidEscape {
                    sequence: source[escape.range()].to_string(),
                    span: escape,
                });
                Token::String(StringLiteral::Ok(String::new()))
            }
            token => token,
        };
        tokens.push(Lexeme {
            token,
            span,
            doc: std::mem::take(&mut doc),
        });
    }

    tokens
}

fn unescape_ident(name: &str) -> String {
    match name.strip_prefix('_') {
        Some(rest) if is_keyword(rest) => rest.to_string(),
        _ => name.to_string(),
    }
}

fn is_decl_start(token: &Token<'_>) -> bool {
    matches!(
        token,
        Token::Hash
            | Token::KeywordType
            | Token::KeywordTuple
            | Token::KeywordInterface
            | Token::KeywordEnum
            | Token::KeywordService
    )
}

fn primitive(token: &Token<'_>) -> Option<Primitive> {
    Some(match token {
        Token::KeywordAny => Primitive::Any,
        Token::KeywordBoolean => Primitive::Boolean,
        Token::KeywordBytes => Primitive::Bytes,
        Token::KeywordDateTime => Primitive::DateTime,
        Token::KeywordDouble => Primitive::Double,
        Token::KeywordFloat => Primitive::Float,
        Token::KeywordI32 => Primitive::I32,
        Token::KeywordI64 => Primitive::I64,
        Token::KeywordString => Primitive::String,
        Token::KeywordU32 => Primitive::U32,
        Token::KeywordU64 => Primitive::U64,
        _ => return None,
    })
}

struct Parser<'s> {
    tokens: Vec<Lexeme<'s>>,
    pos: usize,
    /// Current brace nesting, used for error recovery.
    depth: usize,
    /// Current recursion depth through nested types and declarations.
    nesting: usize,
    /// Span of the most recently consumed token.
    last: Span,
    eof: Span,
    errors: Vec<ParseError>,
}

impl<'s> Parser<'s> {
    fn peek(&self) -> Option<&Token<'s>> {
        self.tokens.get(self.pos).map(|l| &l.token)
    }

    fn at(&self, token: &Token<'s>) -> bool {
        self.peek() == Some(token)
    }

    fn span(&self) -> Span {
        self.tokens.get(self.pos).map(|l| l.span).unwrap_or(self.eof)
    }

    fn bump(&mut self) -> Option<Token<'s>> {
        let lexeme = self.tokens.get(self.pos)?;
        let token = lexeme.token.clone();
        self.last = lexeme.span;
        self.pos += 1;
        match token {
            Token::OpenBrace => self.depth += 1,
            Token::CloseBrace => self.depth = self.depth.saturating_sub(1),
            _ => {}
        }
        Some(token)
    }

    fn bump_span(&mut self) -> Span {
        self.bump();
        self.last
    }

    fn eat(&mut self, token: &Token<'s>) -> bool {
        if self.at(token) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: Token<'s>, expected: &'static str) -> Result<Span, ParseError> {
        if self.at(&token) {
            Ok(self.bump_span())
        } else {
            Err(self.unexpected(expected))
        }
    }

    /// Run `parse` one nesting level deeper, failing past [`MAX_NESTING`].
    fn descend<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        if self.nesting >= MAX_NESTING {
            return Err(ParseError::NestedTooDeep {
                limit: MAX_NESTING,
                span: self.span(),
            });
        }
        self.nesting += 1;
        let result = parse(self);
        self.nesting -= 1;
        result
    }

    fn unexpected(&self, expected: &'static str) -> ParseError {
        match self.peek() {
            Some(token) => ParseError::UnexpectedToken {
                found: token.description(),
                expected,
                span: self.span(),
            },
            None => ParseError::UnexpectedEof {
                expected,
                span: self.eof,
            },
        }
    }

    /// Take the doc comments attached to the next token.
    fn take_doc(&mut self) -> Vec<String> {
        self.tokens
            .get_mut(self.pos)
            .map(|l| std::mem::take(&mut l.doc))
            .unwrap_or_default()
    }

    /// Skip to the next top-level declaration.
    fn recover(&mut self) {
        while let Some(token) = self.peek() {
            if self.depth == 0 && (is_decl_start(token) || *token == Token::KeywordUse) {
                return;
            }
            let token = self.bump();
            if token == Some(Token::CloseBrace) && self.depth == 0 {
                return;
            }
        }
    }

    fn file(&mut self) -> File {
        let mut file = File::default();
        while self.peek().is_some() {
            let result = if self.at(&Token::KeywordUse) {
                self.use_decl().map(|u| file.uses.push(u))
            } else {
                self.decl().map(|d| file.decls.push(d))
            };
            if let Err(error) = result {
                self.errors.push(error);
                self.recover();
            }
        }
        file
    }

    fn ident(&mut self, expected: &'static str) -> Result<Spanned<String>, ParseError> {
        match self.peek() {
            Some(Token::Ident(name)) => {
                let name = unescape_ident(name);
                Ok(Spanned::new(name, self.bump_span()))
            }
            _ => Err(self.unexpected(expected)),
        }
    }

    fn type_ident(&mut self, expected: &'static str) -> Result<Spanned<String>, ParseError> {
        match self.peek() {
            Some(Token::TypeIdent(name)) => {
                let name = name.to_string();
                Ok(Spanned::new(name, self.bump_span()))
            }
            _ => Err(self.unexpected(expected)),
        }
    }

    fn string(&mut self, expected: &'static str) -> Result<Spanned<String>, ParseError> {
        match self.peek() {
            Some(Token::String(StringLiteral::Ok(value))) => {
                let value = value.clone();
                Ok(Spanned::new(value, self.bump_span()))
            }
            _ => Err(self.unexpected(expected)),
        }
    }

    fn value(&mut self) -> Result<Spanned<Value>, ParseError> {
        let span = self.span();
        let value = match self.peek() {
            Some(Token::String(StringLiteral::Ok(value))) => Value::String(value.clone()),
            Some(Token::Number(text)) => Value::Number(
                Number::parse(text).map_err(|error| ParseError::InvalidNumber { error, span })?,
            ),
            Some(Token::KeywordTrue) => Value::Boolean(true),
            Some(Token::KeywordFalse) => Value::Boolean(false),
            Some(Token::Ident(name)) => Value::Identifier(unescape_ident(name)),
            _ => return Err(self.unexpected("a string, number, boolean or identifier")),
        };
        self.bump();
        Ok(Spanned::new(value, span))
    }

    fn use_decl(&mut self) -> Result<UseDecl, ParseError> {
        let start = self.bump_span();
        let first = self.ident("package name")?;
        let mut span = first.span;
        let mut parts = vec![first.value];
        while self.eat(&Token::FullStop) {
            let part = self.ident("package name")?;
            span = span.to(part.span);
            parts.push(part.value);
        }
        let range = if matches!(self.peek(), Some(Token::String(_))) {
            Some(self.string("version range")?)
        } else {
            None
        };
        let alias = if self.eat(&Token::KeywordAs) {
            Some(self.ident("package alias")?)
        } else {
            None
        };
        let end = self.expect(Token::Semicolon, "`;`")?;
        Ok(UseDecl {
            package: Spanned::new(PackageName::new(parts), span),
            range,
            alias,
            span: start.to(end),
        })
    }

    fn attributes(&mut self) -> Result<Vec<Attribute>, ParseError> {
        let mut attributes = Vec::new();
        while self.at(&Token::Hash) {
            let start = self.bump_span();
            self.expect(Token::OpenBracket, "`[`")?;
            let name = self.ident("attribute name")?;
            let mut args = Vec::new();
            if self.eat(&Token::OpenParen) {
                while !self.at(&Token::CloseParen) {
                    let name = self.ident("attribute argument")?;
                    let value = if self.eat(&Token::Equals) {
                        Some(self.value()?)
                    } else {
                        None
                    };
                    args.push(AttributeArg { name, value });
                    if !self.eat(&Token::Comma) {
                        break;
                    }
                }
                self.expect(Token::CloseParen, "`)`")?;
            }
            let end = self.expect(Token::CloseBracket, "`]`")?;
            attributes.push(Attribute {
                name,
                args,
                span: start.to(end),
            });
        }
        Ok(attributes)
    }

    fn decl(&mut self) -> Result<Decl, ParseError> {
        self.descend(Self::declaration)
    }

    fn declaration(&mut self) -> Result<Decl, ParseError> {
        let doc = self.take_doc();
        let start = self.span();
        let attributes = self.attributes()?;

        let keyword = match self.peek() {
            Some(
                token @ (Token::KeywordType
                | Token::KeywordTuple
                | Token::KeywordInterface
                | Token::KeywordEnum
                | Token::KeywordService),
            ) => token.clone(),
            Some(Token::Ident(word)) => {
                return Err(ParseError::UnknownKeyword {
                    word: word.to_string(),
                    expected: DECL_EXPECTED,
                    span: self.span(),
                });
            }
            _ => return Err(self.unexpected(DECL_EXPECTED)),
        };
        self.bump();
        let name = self.type_ident("declaration name")?;

        let kind = match keyword {
            Token::KeywordType => DeclKind::Type(self.type_body()?),
            Token::KeywordTuple => DeclKind::Tuple(self.tuple_body()?),
            Token::KeywordInterface => DeclKind::Interface(self.interface_body()?),
            Token::KeywordEnum => DeclKind::Enum(self.enum_body()?),
            _ => DeclKind::Service(self.service_body()?),
        };

        Ok(Decl {
            doc,
            attributes,
            name,
            kind,
            span: start.to(self.last),
        })
    }

    fn type_body(&mut self) -> Result<Vec<Member>, ParseError> {
        self.expect(Token::OpenBrace, "`{`")?;
        let mut members = Vec::new();
        while !self.at(&Token::CloseBrace) {
            members.push(self.member()?);
        }
        self.expect(Token::CloseBrace, "`}`")?;
        Ok(members)
    }

    /// `{ a: T; ... }` or the positional shorthand `(a: T, b: U)`.
    fn tuple_body(&mut self) -> Result<Vec<Member>, ParseError> {
        if !self.eat(&Token::OpenParen) {
            return self.type_body();
        }
        let mut members = Vec::new();
        while !self.at(&Token::CloseParen) {
            members.push(Member::Field(self.field_parts()?));
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect(Token::CloseParen, "`,` or `)`")?;
        self.eat(&Token::Semicolon);
        Ok(members)
    }

    fn member(&mut self) -> Result<Member, ParseError> {
        match self.peek() {
            Some(Token::Ident(_)) => self.field().map(Member::Field),
            Some(token) if is_decl_start(token) => self.decl().map(Member::Decl),
            _ => Err(self.unexpected("a field or declaration")),
        }
    }

    fn field(&mut self) -> Result<Field, ParseError> {
        let mut field = self.field_parts()?;
        let end = self.expect(Token::Semicolon, "`;`")?;
        field.span = field.span.to(end);
        Ok(field)
    }

    /// A field without its terminator.
    fn field_parts(&mut self) -> Result<Field, ParseError> {
        let doc = self.take_doc();
        let name = self.ident("field name")?;
        let optional = self.eat(&Token::Question);
        self.expect(Token::Colon, "`:`")?;
        let ty = self.type_ref()?;
        let alias = if self.eat(&Token::KeywordAs) {
            Some(self.string("field alias")?)
        } else {
            None
        };
        Ok(Field {
            doc,
            span: name.span.to(self.last),
            name,
            optional,
            ty,
            alias,
        })
    }

    fn interface_body(&mut self) -> Result<InterfaceBody, ParseError> {
        self.expect(Token::OpenBrace, "`{`")?;
        let mut members = Vec::new();
        let mut sub_types = Vec::new();
        while !self.at(&Token::CloseBrace) {
            if matches!(self.peek(), Some(Token::TypeIdent(_))) {
                sub_types.push(self.sub_type()?);
            } else {
                members.push(self.member()?);
            }
        }
        self.expect(Token::CloseBrace, "`}`")?;
        Ok(InterfaceBody { members, sub_types })
    }

    fn sub_type(&mut self) -> Result<SubType, ParseError> {
        let doc = self.take_doc();
        let name = self.type_ident("sub-type name")?;
        let alias = if self.eat(&Token::KeywordAs) {
            Some(self.value()?)
        } else {
            None
        };
        let members = if self.at(&Token::OpenBrace) {
            self.type_body()?
        } else {
            self.expect(Token::Semicolon, "`{` or `;`")?;
            Vec::new()
        };
        Ok(SubType {
            doc,
            span: name.span.to(self.last),
            name,
            alias,
            members,
        })
    }

    fn enum_body(&mut self) -> Result<EnumBody, ParseError> {
        let ty = if self.eat(&Token::KeywordAs) {
            Some(self.type_ref()?)
        } else {
            None
        };
        self.expect(Token::OpenBrace, "`{`")?;
        let mut members = Vec::new();
        while !self.at(&Token::CloseBrace) {
            let doc = self.take_doc();
            let name = self.type_ident("enum member")?;
            let value = if self.eat(&Token::KeywordAs) {
                Some(self.value()?)
            } else {
                None
            };
            let end = self.expect(Token::Semicolon, "`;`")?;
            members.push(EnumMember {
                doc,
                span: name.span.to(end),
                name,
                value,
            });
        }
        self.expect(Token::CloseBrace, "`}`")?;
        Ok(EnumBody { ty, members })
    }

    fn service_body(&mut self) -> Result<ServiceBody, ParseError> {
        self.expect(Token::OpenBrace, "`{`")?;
        let mut endpoints = Vec::new();
        let mut decls = Vec::new();
        while !self.at(&Token::CloseBrace) {
            match self.peek() {
                Some(Token::Ident(_)) => endpoints.push(self.endpoint()?),
                Some(token) if is_decl_start(token) => decls.push(self.decl()?),
                _ => return Err(self.unexpected("an endpoint or declaration")),
            }
        }
        self.expect(Token::CloseBrace, "`}`")?;
        Ok(ServiceBody { endpoints, decls })
    }

    fn endpoint(&mut self) -> Result<Endpoint, ParseError> {
        let doc = self.take_doc();
        let name = self.ident("endpoint name")?;
        self.expect(Token::OpenParen, "`(`")?;
        let mut arguments = Vec::new();
        while !self.at(&Token::CloseParen) {
            let name = self.ident("argument name")?;
            self.expect(Token::Colon, "`:`")?;
            let channel = self.channel()?;
            arguments.push(EndpointArgument { name, channel });
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect(Token::CloseParen, "`,` or `)`")?;
        let response = if self.eat(&Token::HyphenGreater) {
            Some(self.channel()?)
        } else {
            None
        };
        let alias = if self.eat(&Token::KeywordAs) {
            Some(self.string("endpoint alias")?)
        } else {
            None
        };
        let end = self.expect(Token::Semicolon, "`;`")?;
        Ok(Endpoint {
            doc,
            span: name.span.to(end),
            name,
            arguments,
            response,
            alias,
        })
    }

    fn channel(&mut self) -> Result<Channel, ParseError> {
        let streaming = self.eat(&Token::KeywordStream);
        let ty = self.type_ref()?;
        Ok(Channel { streaming, ty })
    }

    fn type_ref(&mut self) -> Result<Spanned<Type>, ParseError> {
        let start = self.span();
        let ty = self.type_inner()?;
        Ok(Spanned::new(ty, start.to(self.last)))
    }

    fn type_inner(&mut self) -> Result<Type, ParseError> {
        self.descend(Self::type_term)
    }

    fn type_term(&mut self) -> Result<Type, ParseError> {
        if let Some(primitive) = self.peek().and_then(primitive) {
            self.bump();
            return Ok(Type::Primitive(primitive));
        }
        match self.peek() {
            Some(Token::OpenBracket) => {
                self.bump();
                let inner = self.type_inner()?;
                self.expect(Token::CloseBracket, "`]`")?;
                Ok(Type::Array(Box::new(inner)))
            }
            Some(Token::OpenBrace) => {
                self.bump();
                let key = self.type_inner()?;
                self.expect(Token::Colon, "`:`")?;
                let value = self.type_inner()?;
                self.expect(Token::CloseBrace, "`}`")?;
                Ok(Type::Map(Box::new(key), Box::new(value)))
            }
            Some(Token::OpenParen) => {
                self.bump();
                let mut items = vec![self.type_inner()?];
                while self.eat(&Token::Comma) {
                    items.push(self.type_inner()?);
                }
                self.expect(Token::CloseParen, "`,` or `)`")?;
                Ok(Type::Tuple(items))
            }
            Some(Token::Ident(_) | Token::TypeIdent(_)) => self.name().map(Type::Name),
            _ => Err(self.unexpected("a type")),
        }
    }

    fn name(&mut self) -> Result<Name, ParseError> {
        let start = self.span();
        let prefix = match self.peek() {
            Some(Token::Ident(prefix)) => {
                let prefix = prefix.to_string();
                self.bump();
                self.expect(Token::ColonColon, "`::`")?;
                Some(prefix)
            }
            _ => None,
        };
        let mut path = vec![self.type_ident("type name")?.value];
        while self.eat(&Token::ColonColon) {
            path.push(self.type_ident("type name")?.value);
        }
        Ok(Name {
            prefix,
            path,
            span: start.to(self.last),
        })
    }
}
