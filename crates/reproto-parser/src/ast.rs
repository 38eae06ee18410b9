//! Syntax tree of a single `.reproto` file.
//!
//! Names in the tree are unresolved; the resolver turns them into handles.

use reproto_core::{Number, PackageName, Primitive, Span, Spanned};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct File {
    /// `//!` package documentation.
    pub doc: Vec<String>,
    pub uses: Vec<UseDecl>,
    pub decls: Vec<Decl>,
}

/// `use foo.bar "^1" as bar;`
#[derive(Debug, Clone, PartialEq)]
pub struct UseDecl {
    pub package: Spanned<PackageName>,
    pub range: Option<Spanned<String>>,
    pub alias: Option<Spanned<String>>,
    pub span: Span,
}

impl UseDecl {
    /// The alias this import is referred to by: explicit, or the last package part.
    pub fn local_name(&self) -> &str {
        match &self.alias {
            Some(alias) => &alias.value,
            None => self.package.value.last(),
        }
    }
}

/// `#[name]` or `#[name(key = value, flag)]`
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: Spanned<String>,
    pub args: Vec<AttributeArg>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttributeArg {
    pub name: Spanned<String>,
    pub value: Option<Spanned<Value>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Number(Number),
    Boolean(bool),
    Identifier(String),
}

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Number(_) => "number",
            Value::Boolean(_) => "boolean",
            Value::Identifier(_) => "identifier",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Decl {
    pub doc: Vec<String>,
    pub attributes: Vec<Attribute>,
    pub name: Spanned<String>,
    pub kind: DeclKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeclKind {
    Type(Vec<Member>),
    Tuple(Vec<Member>),
    Interface(InterfaceBody),
    Enum(EnumBody),
    Service(ServiceBody),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    Field(Field),
    Decl(Decl),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub doc: Vec<String>,
    pub name: Spanned<String>,
    pub optional: bool,
    pub ty: Spanned<Type>,
    /// `as "json_name"`
    pub alias: Option<Spanned<String>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceBody {
    pub members: Vec<Member>,
    pub sub_types: Vec<SubType>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubType {
    pub doc: Vec<String>,
    pub name: Spanned<String>,
    pub alias: Option<Spanned<Value>>,
    pub members: Vec<Member>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumBody {
    pub ty: Option<Spanned<Type>>,
    pub members: Vec<EnumMember>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumMember {
    pub doc: Vec<String>,
    pub name: Spanned<String>,
    pub value: Option<Spanned<Value>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceBody {
    pub endpoints: Vec<Endpoint>,
    pub decls: Vec<Decl>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    pub doc: Vec<String>,
    pub name: Spanned<String>,
    pub arguments: Vec<EndpointArgument>,
    pub response: Option<Channel>,
    pub alias: Option<Spanned<String>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EndpointArgument {
    pub name: Spanned<String>,
    pub channel: Channel,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub streaming: bool,
    pub ty: Spanned<Type>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Primitive(Primitive),
    Name(Name),
    Array(Box<Type>),
    Map(Box<Type>, Box<Type>),
    Tuple(Vec<Type>),
}

/// A possibly-qualified declaration name: `Foo`, `Foo::Inner`, `bar::Other`.
#[derive(Debug, Clone, PartialEq)]
pub struct Name {
    /// Import alias before the first `::`.
    pub prefix: Option<String>,
    pub path: Vec<String>,
    pub span: Span,
}

impl std::fmt::Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(prefix) = &self.prefix {
            write!(f, "{}::", prefix)?;
        }
        f.write_str(&self.path.join("::"))
    }
}
