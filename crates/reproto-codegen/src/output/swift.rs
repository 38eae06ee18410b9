//! Swift backend.
//!
//! Emits one file per package. Top-level declarations are named after their
//! package (`Foo_Bar__1_0_0_Thing`); nested declarations and interface
//! sub-types become nested types, except inside services, which cannot hold
//! types and flatten them instead.
//!
//! Every type conforms to `Equatable`, `Hashable` and
//! `CustomStringConvertible`, so `any` is represented as `AnyHashable`.
//! Decoding and encoding go through `[String: Any]` values and the
//! `decode_value`/`decode_name`/`unbox`/`SerializationError` runtime.

use crate::common::{display_path, field_idents, namespace_segments, type_ident, with_descendants};
use crate::error::EmitError;
use crate::traits::{Backend, Context, Fragment};
use crate::writer::{CodeWriter, quote};
use reproto_core::{
    DeclId, DeclKind, EnumType, EnumValue, Field, InterfaceBody, Package, Primitive, ServiceBody,
    SubType, SubTypeStrategy, TypeRef,
};
use reproto_naming::{Casing, Language, escape_all};
use std::path::{Path, PathBuf};

/// Static instance of the Swift backend for registry.
pub static SWIFT_BACKEND: SwiftBackend = SwiftBackend;

const NAME: &str = "swift";

const CONFORMANCES: &str = "Equatable, Hashable, CustomStringConvertible";

pub struct SwiftBackend;

impl Backend for SwiftBackend {
    fn name(&self) -> &'static str {
        NAME
    }

    fn language(&self) -> &'static str {
        "Swift"
    }

    fn extension(&self) -> &'static str {
        "swift"
    }

    fn path(&self, cx: &Context<'_>, decl: DeclId) -> PathBuf {
        let package = cx.schema.package(decl.package);
        let mut segments = namespace_segments(&package.namespace, Some(Casing::UpperCamel));
        let file = segments.pop().unwrap_or_default();
        let mut path: PathBuf = segments.into_iter().collect();
        path.push(format!("{}.swift", file));
        path
    }

    fn emit_decl(&self, cx: &Context<'_>, decl: DeclId) -> Result<Fragment, EmitError> {
        let mut emitter = Emitter {
            cx: *cx,
            w: CodeWriter::new("  "),
        };
        for id in with_descendants(cx.schema, decl) {
            emitter.check_recursion(id)?;
        }
        emitter.definition(decl)?;
        for id in with_descendants(cx.schema, decl) {
            emitter.extension(id)?;
        }

        let mut fragment = Fragment::new(decl);
        fragment.text = emitter.w.finish();
        Ok(fragment)
    }

    fn assemble(&self, _cx: &Context<'_>, _path: &Path, fragments: &[Fragment]) -> String {
        let mut w = CodeWriter::new("  ");
        w.line("import Foundation");
        for fragment in fragments {
            w.blank();
            w.embed(&fragment.text);
        }
        w.finish()
    }
}

/// Prefix of top-level type names, e.g. `Foo_Bar__1_0_0`.
fn prefix(package: &Package) -> String {
    namespace_segments(&package.namespace, Some(Casing::UpperCamel)).join("_")
}

/// Enum case of each sub-type, lowerCamel so it never shadows the nested struct.
fn sub_type_cases(body: &InterfaceBody) -> Vec<String> {
    escape_all(
        body.sub_types.iter().map(|s| s.name.as_str()),
        Casing::LowerCamel,
        Language::Swift,
    )
    .into_iter()
    .map(|case| match case.as_str() {
        "description" | "hashValue" => format!("{}_", case),
        _ => case,
    })
    .collect()
}

fn property_idents<'f>(fields: impl IntoIterator<Item = &'f Field>) -> Vec<String> {
    field_idents(fields, Casing::LowerSnake, Language::Swift)
}

struct Emitter<'a> {
    cx: Context<'a>,
    w: CodeWriter,
}

impl<'a> Emitter<'a> {
    fn unsupported(&self, id: DeclId, feature: &str) -> EmitError {
        EmitError::unsupported(
            NAME,
            display_path(self.cx.schema, id),
            feature,
            self.cx.schema.decl(id).span,
        )
    }

    fn parent(&self, id: DeclId) -> Option<DeclId> {
        self.cx.schema.decl(id).parent.map(|index| DeclId {
            package: id.package,
            index,
        })
    }

    /// Whether `id` is emitted at file level rather than inside its parent.
    fn is_flat(&self, id: DeclId) -> bool {
        match self.parent(id) {
            None => true,
            Some(parent) => matches!(self.cx.schema.decl(parent).kind, DeclKind::Service(_)),
        }
    }

    /// Name used at the declaration site.
    fn local_name(&self, id: DeclId) -> String {
        if self.is_flat(id) {
            self.qualified(id)
        } else {
            type_ident(&self.cx.schema.decl(id).name, Language::Swift)
        }
    }

    /// Fully qualified type name.
    fn qualified(&self, id: DeclId) -> String {
        let schema = self.cx.schema;
        let ident = type_ident(&schema.decl(id).name, Language::Swift);
        match self.parent(id) {
            None => format!("{}_{}", prefix(schema.package(id.package)), ident),
            Some(parent) if self.is_flat(id) => format!("{}_{}", self.qualified(parent), ident),
            Some(parent) => format!("{}.{}", self.qualified(parent), ident),
        }
    }

    fn sub_type_name(&self, id: DeclId, sub_type: &SubType) -> String {
        format!(
            "{}.{}",
            self.qualified(id),
            type_ident(&sub_type.name, Language::Swift)
        )
    }

    /// Structs cannot contain themselves, even optionally.
    fn check_recursion(&self, id: DeclId) -> Result<(), EmitError> {
        let schema = self.cx.schema;
        if !matches!(schema.decl(id).kind, DeclKind::Type(_) | DeclKind::Tuple(_)) {
            return Ok(());
        }
        let mut stack = vec![id];
        let mut seen = vec![id];
        while let Some(current) = stack.pop() {
            for field in schema.decl(current).fields() {
                let TypeRef::Decl(target) = field.ty else {
                    continue;
                };
                if target == id {
                    return Err(self.unsupported(id, "a struct that contains itself"));
                }
                let is_struct = matches!(
                    schema.decl(target).kind,
                    DeclKind::Type(_) | DeclKind::Tuple(_)
                );
                if is_struct && !seen.contains(&target) {
                    seen.push(target);
                    stack.push(target);
                }
            }
        }
        Ok(())
    }

    fn ty(&self, owner: DeclId, ty: &TypeRef) -> Result<String, EmitError> {
        Ok(match ty {
            TypeRef::Primitive(primitive) => primitive_type(*primitive).to_string(),
            TypeRef::Decl(id) => self.qualified(*id),
            TypeRef::Array(inner) => format!("[{}]", self.ty(owner, inner)?),
            TypeRef::Map(key, value) => {
                format!("[{}: {}]", self.ty(owner, key)?, self.ty(owner, value)?)
            }
            TypeRef::Tuple(_) => return Err(self.unsupported(owner, "inline tuple types")),
        })
    }

    fn field_type(&self, owner: DeclId, field: &Field) -> Result<String, EmitError> {
        let ty = self.ty(owner, &field.ty)?;
        Ok(if field.optional { format!("{}?", ty) } else { ty })
    }

    // ------------------------------------------------------------------
    // Type definitions
    // ------------------------------------------------------------------

    fn definition(&mut self, id: DeclId) -> Result<(), EmitError> {
        let schema = self.cx.schema;
        let decl = schema.decl(id);
        let name = self.local_name(id);
        self.w.doc("///", &decl.doc);

        match &decl.kind {
            DeclKind::Type(body) => {
                let fields: Vec<&Field> = body.fields.iter().collect();
                self.w
                    .open(format!("public struct {}: {} {{", name, CONFORMANCES));
                self.struct_members(id, &decl.name, &fields)?;
                self.nested(id)?;
                self.w.close("}");
            }
            DeclKind::Tuple(body) => {
                let fields: Vec<&Field> = body.fields.iter().collect();
                self.w
                    .open(format!("public struct {}: {} {{", name, CONFORMANCES));
                self.struct_members(id, &decl.name, &fields)?;
                self.nested(id)?;
                self.w.close("}");
            }
            DeclKind::Interface(body) => {
                let cases = sub_type_cases(body);
                self.w.open(format!(
                    "public indirect enum {}: {} {{",
                    name, CONFORMANCES
                ));
                for (sub_type, case) in body.sub_types.iter().zip(&cases) {
                    self.w.doc("///", &sub_type.doc);
                    self.w.line(format!(
                        "case {}({})",
                        case,
                        self.sub_type_name(id, sub_type)
                    ));
                }
                self.w.blank();
                self.w.open("public var description: String {");
                self.w.open("switch self {");
                for case in &cases {
                    self.w.line(format!("case .{}(let v):", case));
                    self.w.line("  return v.description");
                }
                self.w.close("}");
                self.w.close("}");

                for sub_type in &body.sub_types {
                    let fields: Vec<&Field> = body.fields_of(sub_type).collect();
                    self.w.blank();
                    self.w.doc("///", &sub_type.doc);
                    self.w.open(format!(
                        "public struct {}: {} {{",
                        type_ident(&sub_type.name, Language::Swift),
                        CONFORMANCES
                    ));
                    self.struct_members(id, &sub_type.name, &fields)?;
                    self.w.close("}");
                }
                self.nested(id)?;
                self.w.close("}");
            }
            DeclKind::Enum(body) => {
                let cases = escape_all(
                    body.members.iter().map(|m| m.name.as_str()),
                    Casing::UpperCamel,
                    Language::Swift,
                );
                self.w
                    .open(format!("public enum {}: {} {{", name, CONFORMANCES));
                for (member, case) in body.members.iter().zip(&cases) {
                    self.w.doc("///", &member.doc);
                    self.w.line(format!("case {}", case));
                }
                self.w.blank();
                self.w.open("public var description: String {");
                self.w.open("switch self {");
                for (member, case) in body.members.iter().zip(&cases) {
                    self.w.line(format!("case .{}:", case));
                    self.w.line(format!("  return {}", quote(&member.name)));
                }
                self.w.close("}");
                self.w.close("}");
                self.w.close("}");
            }
            DeclKind::Service(body) => {
                self.w.open(format!("public protocol {} {{", name));
                self.service(id, body)?;
                self.w.close("}");
                for (child, _) in schema.package(id.package).children(decl) {
                    self.w.blank();
                    self.definition(child)?;
                }
            }
        }
        Ok(())
    }

    fn nested(&mut self, id: DeclId) -> Result<(), EmitError> {
        let schema = self.cx.schema;
        for (child, _) in schema.package(id.package).children(schema.decl(id)) {
            self.w.blank();
            self.definition(child)?;
        }
        Ok(())
    }

    /// Stored properties, memberwise initializer and `description`.
    fn struct_members(
        &mut self,
        owner: DeclId,
        display: &str,
        fields: &[&Field],
    ) -> Result<(), EmitError> {
        let idents = property_idents(fields.iter().copied());
        let mut types = Vec::with_capacity(fields.len());
        for field in fields {
            types.push(self.field_type(owner, field)?);
        }

        for ((field, ident), ty) in fields.iter().zip(&idents).zip(&types) {
            self.w.doc("///", &field.doc);
            self.w.line(format!("public let {}: {}", ident, ty));
        }
        self.w.blank();

        let params: Vec<String> = idents
            .iter()
            .zip(&types)
            .map(|(ident, ty)| format!("{}: {}", ident, ty))
            .collect();
        self.w
            .open(format!("public init({}) {{", params.join(", ")));
        for ident in &idents {
            self.w.line(format!("self.{0} = {0}", ident));
        }
        self.w.close("}");
        self.w.blank();

        let parts: Vec<String> = fields
            .iter()
            .zip(&idents)
            .map(|(field, ident)| {
                format!("{}=\\(String(describing: self.{}))", field.name, ident)
            })
            .collect();
        self.w.open("public var description: String {");
        self.w
            .line(format!("return \"{}({})\"", display, parts.join(", ")));
        self.w.close("}");
        Ok(())
    }

    fn service(&mut self, id: DeclId, body: &ServiceBody) -> Result<(), EmitError> {
        let methods = escape_all(
            body.endpoints.iter().map(|e| e.name.as_str()),
            Casing::LowerCamel,
            Language::Swift,
        );
        for (endpoint, method) in body.endpoints.iter().zip(&methods) {
            let streaming = endpoint.arguments.iter().any(|a| a.channel.streaming)
                || endpoint.response.as_ref().is_some_and(|r| r.streaming);
            if streaming {
                return Err(self.unsupported(id, "streaming endpoints"));
            }

            let params = escape_all(
                endpoint.arguments.iter().map(|a| a.name.as_str()),
                Casing::LowerCamel,
                Language::Swift,
            );
            let mut arguments = Vec::with_capacity(params.len());
            for (argument, param) in endpoint.arguments.iter().zip(&params) {
                arguments.push(format!("{}: {}", param, self.ty(id, &argument.channel.ty)?));
            }
            let response = match &endpoint.response {
                Some(channel) => format!(" -> {}", self.ty(id, &channel.ty)?),
                None => String::new(),
            };
            self.w.doc("///", &endpoint.doc);
            self.w.line(format!(
                "func {}({}) throws{}",
                method,
                arguments.join(", "),
                response
            ));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Serialization
    // ------------------------------------------------------------------

    fn extension(&mut self, id: DeclId) -> Result<(), EmitError> {
        let schema = self.cx.schema;
        let decl = schema.decl(id);
        let name = self.qualified(id);

        match &decl.kind {
            DeclKind::Type(body) => {
                let fields: Vec<&Field> = body.fields.iter().collect();
                self.object_codec(id, &name, &fields)?;
            }
            DeclKind::Tuple(body) => {
                let fields: Vec<&Field> = body.fields.iter().collect();
                self.tuple_codec(id, &name, &fields)?;
            }
            DeclKind::Interface(body) => {
                self.interface_codec(id, &name, body);
                for sub_type in &body.sub_types {
                    let fields: Vec<&Field> = body.fields_of(sub_type).collect();
                    let sub_name = self.sub_type_name(id, sub_type);
                    self.object_codec(id, &sub_name, &fields)?;
                }
            }
            DeclKind::Enum(body) => {
                let cases = escape_all(
                    body.members.iter().map(|m| m.name.as_str()),
                    Casing::UpperCamel,
                    Language::Swift,
                );
                let raw = match body.ty {
                    EnumType::String => "String",
                    EnumType::U32 => "UInt32",
                    EnumType::U64 => "UInt64",
                    EnumType::I32 => "Int32",
                    EnumType::I64 => "Int64",
                };
                self.w.blank();
                self.w.open(format!("public extension {} {{", name));
                self.w
                    .open(format!("static func decode(json: Any) throws -> {} {{", name));
                self.w.line(format!(
                    "let value = try decode_value(unbox(json, as: {}.self))",
                    raw
                ));
                self.w.blank();
                self.w.open("switch value {");
                for (member, case) in body.members.iter().zip(&cases) {
                    self.w.line(format!("case {}:", literal(&member.value)));
                    self.w.line(format!("  return {}.{}", name, case));
                }
                self.w.line("default:");
                self.w.line("  throw SerializationError.bad_value");
                self.w.close("}");
                self.w.close("}");
                self.w.blank();
                self.w
                    .open(format!("func encode() throws -> {} {{", raw));
                self.w.open("switch self {");
                for (member, case) in body.members.iter().zip(&cases) {
                    self.w.line(format!("case .{}:", case));
                    self.w.line(format!("  return {}", literal(&member.value)));
                }
                self.w.close("}");
                self.w.close("}");
                self.w.close("}");
            }
            DeclKind::Service(_) => {}
        }
        Ok(())
    }

    fn object_codec(&mut self, owner: DeclId, name: &str, fields: &[&Field]) -> Result<(), EmitError> {
        let idents = property_idents(fields.iter().copied());

        self.w.blank();
        self.w.open(format!("public extension {} {{", name));
        self.w
            .open(format!("static func decode(json: Any) throws -> {} {{", name));
        self.w
            .line("let json = try decode_value(json as? [String: Any])");

        for (field, ident) in fields.iter().zip(&idents) {
            let key = quote(&field.json_name);
            self.w.blank();
            if field.optional {
                let ty = self.field_type(owner, field)?;
                let value = self.decode_expr(owner, &field.ty, "value", &key, 0)?;
                self.w
                    .line(format!("var v_{}: {} = Optional.none", ident, ty));
                self.w.blank();
                self.w.open(format!("if let value = json[{}] {{", key));
                self.w
                    .line(format!("v_{} = Optional.some({})", ident, value));
                self.w.close("}");
            } else {
                let raw = format!("f_{}", ident);
                let value = self.decode_expr(owner, &field.ty, &raw, &key, 0)?;
                self.w.open(format!("guard let {} = json[{}] else {{", raw, key));
                self.w
                    .line(format!("throw SerializationError.missing({})", key));
                self.w.close("}");
                self.w.blank();
                self.w.line(format!("let v_{} = {}", ident, value));
            }
        }

        let arguments: Vec<String> = idents
            .iter()
            .map(|ident| format!("{0}: v_{0}", ident))
            .collect();
        self.w.blank();
        self.w
            .line(format!("return {}({})", name, arguments.join(", ")));
        self.w.close("}");
        self.w.blank();

        self.w.open("func encode() throws -> [String: Any] {");
        self.w.line("var json = [String: Any]()");
        self.w.blank();
        for (field, ident) in fields.iter().zip(&idents) {
            let key = quote(&field.json_name);
            if field.optional {
                let value = self.encode_expr(owner, &field.ty, "value", 0)?;
                self.w.open(format!("if let value = self.{} {{", ident));
                self.w.line(format!("json[{}] = {}", key, value));
                self.w.close("}");
            } else {
                let value = self.encode_expr(owner, &field.ty, &format!("self.{}", ident), 0)?;
                self.w.line(format!("json[{}] = {}", key, value));
            }
        }
        self.w.blank();
        self.w.line("return json");
        self.w.close("}");
        self.w.close("}");
        Ok(())
    }

    fn tuple_codec(&mut self, owner: DeclId, name: &str, fields: &[&Field]) -> Result<(), EmitError> {
        let idents = property_idents(fields.iter().copied());

        self.w.blank();
        self.w.open(format!("public extension {} {{", name));
        self.w
            .open(format!("static func decode(json: Any) throws -> {} {{", name));
        self.w.line("let json = try decode_value(json as? [Any])");

        for (index, (field, ident)) in fields.iter().zip(&idents).enumerate() {
            let key = quote(&format!("[{}]", index));
            let value = self.decode_expr(owner, &field.ty, &format!("json[{}]", index), &key, 0)?;
            self.w.blank();
            self.w.open(format!("guard json.count > {} else {{", index));
            self.w
                .line(format!("throw SerializationError.missing({})", key));
            self.w.close("}");
            self.w.blank();
            self.w.line(format!("let v_{} = {}", ident, value));
        }

        let arguments: Vec<String> = idents
            .iter()
            .map(|ident| format!("{0}: v_{0}", ident))
            .collect();
        self.w.blank();
        self.w
            .line(format!("return {}({})", name, arguments.join(", ")));
        self.w.close("}");
        self.w.blank();

        self.w.open("func encode() throws -> [Any] {");
        self.w.line("var json = [Any]()");
        self.w.blank();
        for (field, ident) in fields.iter().zip(&idents) {
            let value = self.encode_expr(owner, &field.ty, &format!("self.{}", ident), 0)?;
            self.w.line(format!("json.append({})", value));
        }
        self.w.blank();
        self.w.line("return json");
        self.w.close("}");
        self.w.close("}");
        Ok(())
    }

    fn interface_codec(&mut self, id: DeclId, name: &str, body: &InterfaceBody) {
        let cases = sub_type_cases(body);
        self.w.blank();
        self.w.open(format!("public extension {} {{", name));
        self.w
            .open(format!("static func decode(json: Any) throws -> {} {{", name));
        self.w
            .line("let json = try decode_value(json as? [String: Any])");
        self.w.blank();

        match &body.strategy {
            SubTypeStrategy::Tagged { tag } => {
                let key = quote(tag);
                self.w.line(format!(
                    "let tag = try decode_name(json[{}] as? String, name: {})",
                    key, key
                ));
                self.w.blank();
                self.w.open("switch tag {");
                for (sub_type, case) in body.sub_types.iter().zip(&cases) {
                    self.w.line(format!("case {}:", quote(&sub_type.literal)));
                    self.w.line(format!(
                        "  return {}.{}(try {}.decode(json: json))",
                        name,
                        case,
                        self.sub_type_name(id, sub_type)
                    ));
                }
                self.w.line("default:");
                self.w.line("  throw SerializationError.invalid(tag)");
                self.w.close("}");
            }
            SubTypeStrategy::Untagged => {
                self.w.line("let keys = Set(json.keys)");
                for (sub_type, case) in body.sub_types.iter().zip(&cases) {
                    let required: Vec<String> = body
                        .fields_of(sub_type)
                        .filter(|f| f.is_required())
                        .map(|f| quote(&f.json_name))
                        .collect();
                    self.w.blank();
                    self.w.open(format!(
                        "if keys.isSuperset(of: [{}] as [String]) {{",
                        required.join(", ")
                    ));
                    self.w.line(format!(
                        "return {}.{}(try {}.decode(json: json))",
                        name,
                        case,
                        self.sub_type_name(id, sub_type)
                    ));
                    self.w.close("}");
                }
                self.w.blank();
                self.w.line(
                    "throw SerializationError.invalid(\"no sub-type matches the fields present\")",
                );
            }
        }
        self.w.close("}");
        self.w.blank();

        self.w.open("func encode() throws -> [String: Any] {");
        self.w.open("switch self {");
        for (sub_type, case) in body.sub_types.iter().zip(&cases) {
            self.w.line(format!("case .{}(let s):", case));
            match &body.strategy {
                SubTypeStrategy::Tagged { tag } => {
                    self.w.line("  var json = try s.encode()");
                    self.w.line(format!(
                        "  json[{}] = {}",
                        quote(tag),
                        quote(&sub_type.literal)
                    ));
                    self.w.line("  return json");
                }
                SubTypeStrategy::Untagged => self.w.line("  return try s.encode()"),
            }
        }
        self.w.close("}");
        self.w.close("}");
        self.w.close("}");
    }

    /// Expression decoding the `Any` value `value`; `name` is a string literal for errors.
    fn decode_expr(
        &self,
        owner: DeclId,
        ty: &TypeRef,
        value: &str,
        name: &str,
        depth: usize,
    ) -> Result<String, EmitError> {
        Ok(match ty {
            TypeRef::Primitive(Primitive::DateTime) => format!(
                "try decode_name(unbox({}, as: String.self).flatMap {{ ISO8601DateFormatter().date(from: $0) }}, name: {})",
                value, name
            ),
            TypeRef::Primitive(Primitive::Bytes) => format!(
                "try decode_name(unbox({}, as: String.self).flatMap {{ Data(base64Encoded: $0) }}, name: {})",
                value, name
            ),
            TypeRef::Primitive(Primitive::Any) => {
                format!("try decode_name({} as? AnyHashable, name: {})", value, name)
            }
            TypeRef::Primitive(primitive) => format!(
                "try decode_name(unbox({}, as: {}.self), name: {})",
                value,
                primitive_type(*primitive),
                name
            ),
            TypeRef::Decl(id) => format!("try {}.decode(json: {})", self.qualified(*id), value),
            TypeRef::Array(inner) => {
                let item = format!("v{}", depth);
                format!(
                    "try decode_name({} as? [Any], name: {}).map {{ {} in {} }}",
                    value,
                    name,
                    item,
                    self.decode_expr(owner, inner, &item, name, depth + 1)?
                )
            }
            TypeRef::Map(key, inner) => {
                let (map, entry) = (format!("m{}", depth), format!("e{}", depth));
                let key_expr = match key.as_ref() {
                    TypeRef::Primitive(p) if p.is_integer() => format!(
                        "try decode_name({}({}.key), name: {})",
                        primitive_type(*p),
                        entry,
                        name
                    ),
                    _ => format!("{}.key", entry),
                };
                format!(
                    "try decode_name({} as? [String: Any], name: {}).reduce(into: [{}: {}]()) {{ {}, {} in {}[{}] = {} }}",
                    value,
                    name,
                    self.ty(owner, key)?,
                    self.ty(owner, inner)?,
                    map,
                    entry,
                    map,
                    key_expr,
                    self.decode_expr(owner, inner, &format!("{}.value", entry), name, depth + 1)?
                )
            }
            TypeRef::Tuple(_) => return Err(self.unsupported(owner, "inline tuple types")),
        })
    }

    /// Expression encoding `value` into an `Any`.
    fn encode_expr(
        &self,
        owner: DeclId,
        ty: &TypeRef,
        value: &str,
        depth: usize,
    ) -> Result<String, EmitError> {
        Ok(match ty {
            TypeRef::Primitive(Primitive::DateTime) => {
                format!("ISO8601DateFormatter().string(from: {})", value)
            }
            TypeRef::Primitive(Primitive::Bytes) => format!("{}.base64EncodedString()", value),
            TypeRef::Primitive(Primitive::Any) => format!("{}.base", value),
            TypeRef::Primitive(_) => value.to_string(),
            TypeRef::Decl(_) => format!("try {}.encode()", value),
            TypeRef::Array(inner) => {
                let item = format!("v{}", depth);
                format!(
                    "try {}.map {{ {} in {} }}",
                    value,
                    item,
                    self.encode_expr(owner, inner, &item, depth + 1)?
                )
            }
            TypeRef::Map(key, inner) => {
                let (map, entry) = (format!("m{}", depth), format!("e{}", depth));
                let key_expr = match key.as_ref() {
                    TypeRef::Primitive(p) if p.is_integer() => format!("String({}.key)", entry),
                    _ => format!("{}.key", entry),
                };
                format!(
                    "try {}.reduce(into: [String: Any]()) {{ {}, {} in {}[{}] = {} }}",
                    value,
                    map,
                    entry,
                    map,
                    key_expr,
                    self.encode_expr(owner, inner, &format!("{}.value", entry), depth + 1)?
                )
            }
            TypeRef::Tuple(_) => return Err(self.unsupported(owner, "inline tuple types")),
        })
    }
}

fn primitive_type(primitive: Primitive) -> &'static str {
    match primitive {
        Primitive::Boolean => "Bool",
        Primitive::String => "String",
        Primitive::DateTime => "Date",
        Primitive::Bytes => "Data",
        Primitive::Any => "AnyHashable",
        Primitive::U32 => "UInt32",
        Primitive::U64 => "UInt64",
        Primitive::I32 => "Int32",
        Primitive::I64 => "Int64",
        Primitive::Float => "Float",
        Primitive::Double => "Double",
    }
}

fn literal(value: &EnumValue) -> String {
    match value {
        EnumValue::String(value) => quote(value),
        EnumValue::Number(value) => value.to_string(),
    }
}
