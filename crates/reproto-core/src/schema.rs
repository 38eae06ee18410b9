//! The resolved schema model.
//!
//! Built once by the resolver and read-only afterwards. Declarations are
//! stored in per-package tables and referenced through [`DeclId`] handles.

use crate::namespace::Namespace;
use crate::package::{PackageName, display_identity};
use crate::source::Span;
use semver::Version;
use serde::Deserialize;
use std::fmt;

/// Index of a package in a [`Schema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageId(pub usize);

/// Handle to a declaration: its package plus its index in that package's table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclId {
    pub package: PackageId,
    pub index: usize,
}

/// A fully resolved set of packages.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    pub packages: Vec<Package>,
}

impl Schema {
    pub fn package(&self, id: PackageId) -> &Package {
        &self.packages[id.0]
    }

    pub fn decl(&self, id: DeclId) -> &Decl {
        &self.packages[id.package.0].decls[id.index]
    }

    /// Find a package by exact identity.
    pub fn find_package(&self, name: &PackageName, version: Option<&Version>) -> Option<PackageId> {
        self.packages
            .iter()
            .find(|p| &p.name == name && p.version.as_ref() == version)
            .map(|p| p.id)
    }

    /// Look up a declaration by its path within a package, e.g. `["Foo", "Inner"]`.
    pub fn lookup(&self, package: PackageId, path: &[&str]) -> Option<DeclId> {
        let package = self.package(package);
        let (first, rest) = path.split_first()?;
        let mut current = package
            .roots
            .iter()
            .copied()
            .find(|&i| package.decls[i].name == *first)?;
        for segment in rest {
            current = package.decls[current]
                .children
                .iter()
                .copied()
                .find(|&i| package.decls[i].name == *segment)?;
        }
        Some(DeclId {
            package: package.id,
            index: current,
        })
    }

    /// Names from the outermost enclosing declaration down to `id`.
    pub fn decl_path(&self, id: DeclId) -> Vec<&str> {
        let package = self.package(id.package);
        let mut path = Vec::new();
        let mut current = Some(id.index);
        while let Some(index) = current {
            let decl = &package.decls[index];
            path.push(decl.name.as_str());
            current = decl.parent;
        }
        path.reverse();
        path
    }

    /// The outermost declaration enclosing `id` (or `id` itself).
    pub fn root_of(&self, id: DeclId) -> DeclId {
        let package = self.package(id.package);
        let mut index = id.index;
        while let Some(parent) = package.decls[index].parent {
            index = parent;
        }
        DeclId {
            package: id.package,
            index,
        }
    }

    /// All declarations in all packages, in package then source order.
    pub fn decls(&self) -> impl Iterator<Item = (DeclId, &Decl)> {
        self.packages.iter().flat_map(|p| p.decls())
    }

    /// Whether `ty` mentions anything satisfying `predicate`, following
    /// declaration references transitively. Each declaration is visited once.
    pub fn type_contains(&self, ty: &TypeRef, predicate: &dyn Fn(&TypeRef) -> bool) -> bool {
        let mut seen = Vec::new();
        self.type_contains_inner(ty, predicate, &mut seen)
    }

    fn type_contains_inner(
        &self,
        ty: &TypeRef,
        predicate: &dyn Fn(&TypeRef) -> bool,
        seen: &mut Vec<DeclId>,
    ) -> bool {
        if predicate(ty) {
            return true;
        }
        match ty {
            TypeRef::Primitive(_) => false,
            TypeRef::Array(inner) => self.type_contains_inner(inner, predicate, seen),
            TypeRef::Map(key, value) => {
                self.type_contains_inner(key, predicate, seen)
                    || self.type_contains_inner(value, predicate, seen)
            }
            TypeRef::Tuple(items) => items
                .iter()
                .any(|item| self.type_contains_inner(item, predicate, seen)),
            TypeRef::Decl(id) => {
                if seen.contains(id) {
                    return false;
                }
                seen.push(*id);
                self.decl(*id)
                    .all_fields()
                    .any(|field| self.type_contains_inner(&field.ty, predicate, seen))
            }
        }
    }
}

/// A package: a name, an optional version and its declarations.
#[derive(Debug, Clone)]
pub struct Package {
    pub id: PackageId,
    pub name: PackageName,
    pub version: Option<Version>,
    /// Target-independent namespace segments assigned by the namespacer.
    pub namespace: Namespace,
    pub doc: Vec<String>,
    /// Every declaration in the package, nested ones included.
    pub decls: Vec<Decl>,
    /// Indices of top-level declarations, in source order.
    pub roots: Vec<usize>,
}

impl Package {
    pub fn decls(&self) -> impl Iterator<Item = (DeclId, &Decl)> {
        let package = self.id;
        self.decls
            .iter()
            .enumerate()
            .map(move |(index, decl)| (DeclId { package, index }, decl))
    }

    pub fn roots(&self) -> impl Iterator<Item = (DeclId, &Decl)> {
        let package = self.id;
        self.roots.iter().map(move |&index| {
            (DeclId { package, index }, &self.decls[index])
        })
    }

    pub fn children(&self, decl: &Decl) -> impl Iterator<Item = (DeclId, &Decl)> {
        let package = self.id;
        decl.children.iter().map(move |&index| {
            (DeclId { package, index }, &self.decls[index])
        })
    }

    /// `name@version`, or `name` when unversioned.
    pub fn identity(&self) -> String {
        display_identity(&self.name, self.version.as_ref())
    }
}

/// One named declaration.
#[derive(Debug, Clone)]
pub struct Decl {
    pub id: DeclId,
    pub name: String,
    pub doc: Vec<String>,
    /// Enclosing declaration, by index into the same package.
    pub parent: Option<usize>,
    /// Nested declarations, by index into the same package.
    pub children: Vec<usize>,
    pub kind: DeclKind,
    pub span: Span,
}

impl Decl {
    pub fn package(&self) -> PackageId {
        self.id.package
    }

    /// Fields of a type or tuple, or the shared fields of an interface.
    pub fn fields(&self) -> &[Field] {
        match &self.kind {
            DeclKind::Type(body) => &body.fields,
            DeclKind::Tuple(body) => &body.fields,
            DeclKind::Interface(body) => &body.fields,
            DeclKind::Enum(_) | DeclKind::Service(_) => &[],
        }
    }

    /// Every field in the declaration, including interface sub-type fields.
    pub fn all_fields(&self) -> Box<dyn Iterator<Item = &Field> + '_> {
        match &self.kind {
            DeclKind::Interface(body) => Box::new(
                body.fields
                    .iter()
                    .chain(body.sub_types.iter().flat_map(|s| s.fields.iter())),
            ),
            _ => Box::new(self.fields().iter()),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        self.kind.name()
    }
}

#[derive(Debug, Clone)]
pub enum DeclKind {
    Type(TypeBody),
    Tuple(TupleBody),
    Interface(InterfaceBody),
    Enum(EnumBody),
    Service(ServiceBody),
}

impl DeclKind {
    pub fn name(&self) -> &'static str {
        match self {
            DeclKind::Type(_) => "type",
            DeclKind::Tuple(_) => "tuple",
            DeclKind::Interface(_) => "interface",
            DeclKind::Enum(_) => "enum",
            DeclKind::Service(_) => "service",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TypeBody {
    pub fields: Vec<Field>,
}

/// Positional fields; order is the wire order.
#[derive(Debug, Clone, Default)]
pub struct TupleBody {
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone)]
pub struct InterfaceBody {
    /// Fields shared by every sub-type.
    pub fields: Vec<Field>,
    pub sub_types: Vec<SubType>,
    pub strategy: SubTypeStrategy,
}

impl InterfaceBody {
    /// Shared fields followed by the sub-type's own fields.
    pub fn fields_of<'a>(&'a self, sub_type: &'a SubType) -> impl Iterator<Item = &'a Field> {
        self.fields.iter().chain(sub_type.fields.iter())
    }
}

/// How the sub-type of an interface is recovered from JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubTypeStrategy {
    /// A discriminator key holds the sub-type literal.
    Tagged { tag: String },
    /// The sub-type is recognized by which required keys are present.
    Untagged,
}

/// Where a tagged interface writes its discriminator relative to the payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiscriminatorPlacement {
    First,
    #[default]
    Last,
}

impl DiscriminatorPlacement {
    pub fn name(&self) -> &'static str {
        match self {
            DiscriminatorPlacement::First => "first",
            DiscriminatorPlacement::Last => "last",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "first" => Some(DiscriminatorPlacement::First),
            "last" => Some(DiscriminatorPlacement::Last),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SubType {
    pub name: String,
    /// Discriminator literal; the sub-type name unless overridden.
    pub literal: String,
    pub doc: Vec<String>,
    pub fields: Vec<Field>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct EnumBody {
    pub ty: EnumType,
    pub members: Vec<EnumMember>,
}

/// Serialized representation of enum members.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumType {
    String,
    U32,
    U64,
    I32,
    I64,
}

impl EnumType {
    pub fn name(&self) -> &'static str {
        match self {
            EnumType::String => "string",
            EnumType::U32 => "u32",
            EnumType::U64 => "u64",
            EnumType::I32 => "i32",
            EnumType::I64 => "i64",
        }
    }

    /// Inclusive range of legal values for numeric enum types.
    pub fn range(&self) -> Option<(i128, i128)> {
        match self {
            EnumType::String => None,
            EnumType::U32 => Some((0, u32::MAX as i128)),
            EnumType::U64 => Some((0, u64::MAX as i128)),
            EnumType::I32 => Some((i32::MIN as i128, i32::MAX as i128)),
            EnumType::I64 => Some((i64::MIN as i128, i64::MAX as i128)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EnumMember {
    pub name: String,
    pub value: EnumValue,
    pub doc: Vec<String>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EnumValue {
    String(String),
    Number(i128),
}

impl fmt::Display for EnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnumValue::String(value) => write!(f, "{:?}", value),
            EnumValue::Number(value) => write!(f, "{}", value),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ServiceBody {
    pub endpoints: Vec<Endpoint>,
}

#[derive(Debug, Clone)]
pub struct Endpoint {
    pub name: String,
    /// Wire name of the endpoint; defaults to `name`.
    pub id: String,
    pub doc: Vec<String>,
    pub arguments: Vec<Argument>,
    pub response: Option<Channel>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Argument {
    pub name: String,
    pub channel: Channel,
}

#[derive(Debug, Clone)]
pub struct Channel {
    pub ty: TypeRef,
    pub streaming: bool,
}

/// A named (or, in tuples, positional) member of a declaration.
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    /// Key used in JSON; defaults to `name`.
    pub json_name: String,
    pub ty: TypeRef,
    pub optional: bool,
    pub doc: Vec<String>,
    pub span: Span,
}

impl Field {
    pub fn is_required(&self) -> bool {
        !self.optional
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Primitive(Primitive),
    Decl(DeclId),
    Array(Box<TypeRef>),
    Map(Box<TypeRef>, Box<TypeRef>),
    /// Anonymous positional tuple, e.g. `(string, u32)`.
    Tuple(Vec<TypeRef>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Boolean,
    String,
    DateTime,
    Bytes,
    Any,
    U32,
    U64,
    I32,
    I64,
    Float,
    Double,
}

impl Primitive {
    pub fn name(&self) -> &'static str {
        match self {
            Primitive::Boolean => "boolean",
            Primitive::String => "string",
            Primitive::DateTime => "datetime",
            Primitive::Bytes => "bytes",
            Primitive::Any => "any",
            Primitive::U32 => "u32",
            Primitive::U64 => "u64",
            Primitive::I32 => "i32",
            Primitive::I64 => "i64",
            Primitive::Float => "float",
            Primitive::Double => "double",
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            Primitive::U32 | Primitive::U64 | Primitive::I32 | Primitive::I64
        )
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
