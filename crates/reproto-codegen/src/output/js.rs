//! JavaScript backend.
//!
//! Emits one ES module per package. Each file opens with a small set of
//! validation helpers so that generated code has no runtime dependency.
//! Top-level declarations are exported classes; nested declarations and
//! interface sub-types are assigned as static members of their parent class.
//! Other packages are imported as namespaces, e.g.
//! `import * as bar__1_0_0 from "../bar/_1_0_0.js"`.

use crate::common::{display_path, field_idents, namespace_segments, type_ident, with_descendants};
use crate::error::EmitError;
use crate::traits::{Backend, Context, Fragment};
use crate::writer::{CodeWriter, quote};
use reproto_core::{
    DeclId, DeclKind, DiscriminatorPlacement, EnumBody, EnumValue, Field, InterfaceBody, Package,
    Primitive, SubTypeStrategy, TypeRef,
};
use reproto_naming::{Casing, Language, escape, escape_all};
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

/// Static instance of the JavaScript backend for registry.
pub static JS_BACKEND: JsBackend = JsBackend;

const NAME: &str = "js";

/// Largest integer a JavaScript number holds exactly.
const MAX_SAFE_INTEGER: i128 = (1 << 53) - 1;

const PRELUDE: &str = r#"function _fail(name, expected, value) {
  throw new Error(name + ": expected " + expected + ", got " + JSON.stringify(value));
}

function _present(data, key) {
  return Object.prototype.hasOwnProperty.call(data, key) && data[key] !== null && data[key] !== undefined;
}

function _put(out, key, value) {
  Object.defineProperty(out, key, { value, enumerable: true, writable: true, configurable: true });
}

function _object(name, value) {
  if (value === null || typeof value !== "object" || Array.isArray(value)) {
    _fail(name, "object", value);
  }
  return value;
}

function _string(name, value) {
  if (typeof value !== "string") {
    _fail(name, "string", value);
  }
  return value;
}

function _boolean(name, value) {
  if (typeof value !== "boolean") {
    _fail(name, "boolean", value);
  }
  return value;
}

function _number(name, value) {
  if (typeof value !== "number") {
    _fail(name, "number", value);
  }
  return value;
}

function _integer(name, value, min, max) {
  if (!Number.isInteger(value) || value < min || value > max) {
    _fail(name, "integer in [" + min + ", " + max + "]", value);
  }
  return value;
}

function _integerKey(name, key, min, max) {
  _integer(name, /^-?[0-9]+$/.test(key) ? Number(key) : NaN, min, max);
  return key;
}

function _array(name, value, decode) {
  if (!Array.isArray(value)) {
    _fail(name, "array", value);
  }
  return value.map(decode);
}

function _map(name, value, key, decode) {
  _object(name, value);
  const out = {};
  for (const k of Object.keys(value)) {
    _put(out, key(k), decode(value[k]));
  }
  return out;
}

function _encodeMap(value, encode) {
  const out = {};
  for (const k of Object.keys(value)) {
    _put(out, k, encode(value[k]));
  }
  return out;
}

function _tuple(name, value, decoders) {
  if (!Array.isArray(value)) {
    _fail(name, "array", value);
  }
  if (value.length < decoders.length) {
    throw new Error(name + "[" + value.length + "]: missing field");
  }
  return decoders.map((decode, i) => decode(value[i]));
}

function _equals(a, b) {
  if (a === b) {
    return true;
  }
  if (a === null || b === null || typeof a !== "object" || typeof b !== "object") {
    return false;
  }
  if (typeof a.equals === "function") {
    return a.equals(b);
  }
  if (Array.isArray(a)) {
    if (!Array.isArray(b) || a.length !== b.length) {
      return false;
    }
    return a.every((item, i) => _equals(item, b[i]));
  }
  const keys = Object.keys(a);
  if (keys.length !== Object.keys(b).length) {
    return false;
  }
  return keys.every((k) => Object.prototype.hasOwnProperty.call(b, k) && _equals(a[k], b[k]));
}

function _hash(value) {
  if (value === null || value === undefined) {
    return 0;
  }
  if (typeof value.hashCode === "function") {
    return value.hashCode();
  }
  if (typeof value === "boolean") {
    return value ? 1231 : 1237;
  }
  if (typeof value === "number") {
    return _hash(String(value));
  }
  if (typeof value === "string") {
    let result = 0;
    for (let i = 0; i < value.length; i++) {
      result = (result * 31 + value.charCodeAt(i)) | 0;
    }
    return result;
  }
  if (Array.isArray(value)) {
    let result = 1;
    for (const item of value) {
      result = (result * 31 + _hash(item)) | 0;
    }
    return result;
  }
  let result = 0;
  for (const k of Object.keys(value)) {
    result = (result + (_hash(k) ^ _hash(value[k]))) | 0;
  }
  return result;
}"#;

pub struct JsBackend;

impl Backend for JsBackend {
    fn name(&self) -> &'static str {
        NAME
    }

    fn language(&self) -> &'static str {
        "JavaScript"
    }

    fn extension(&self) -> &'static str {
        "js"
    }

    fn path(&self, cx: &Context<'_>, decl: DeclId) -> PathBuf {
        package_path(cx.schema.package(decl.package))
    }

    fn emit_decl(&self, cx: &Context<'_>, decl: DeclId) -> Result<Fragment, EmitError> {
        let mut emitter = Emitter {
            cx: *cx,
            fragment: Fragment::new(decl),
            w: CodeWriter::new("  "),
        };
        for id in with_descendants(cx.schema, decl) {
            emitter.decl(id)?;
        }
        emitter.fragment.text = emitter.w.finish();
        Ok(emitter.fragment)
    }

    fn assemble(&self, cx: &Context<'_>, path: &Path, fragments: &[Fragment]) -> String {
        let imports: BTreeSet<_> = fragments.iter().flat_map(|f| &f.imports).collect();

        let mut w = CodeWriter::new("  ");
        for package in imports {
            let package = cx.schema.package(*package);
            w.line(format!(
                "import * as {} from {};",
                alias(package),
                quote(&relative(path, &package_path(package)))
            ));
        }
        w.blank();
        w.embed(PRELUDE);
        for fragment in fragments {
            w.blank();
            w.embed(&fragment.text);
        }
        w.finish()
    }
}

fn package_path(package: &Package) -> PathBuf {
    let mut segments = namespace_segments(&package.namespace, None);
    let file = segments.pop().unwrap_or_default();
    let mut path: PathBuf = segments.into_iter().collect();
    path.push(format!("{}.js", file));
    path
}

/// Module specifier of `to` as seen from the file `from`.
fn relative(from: &Path, to: &Path) -> String {
    let from: Vec<Component> = from.parent().map(|p| p.components().collect()).unwrap_or_default();
    let to: Vec<Component> = to.components().collect();
    let common = from.iter().zip(&to).take_while(|(a, b)| a == b).count();

    let mut parts: Vec<String> = vec!["..".to_string(); from.len() - common];
    if parts.is_empty() {
        parts.push(".".to_string());
    }
    parts.extend(
        to[common..]
            .iter()
            .map(|c| c.as_os_str().to_string_lossy().into_owned()),
    );
    parts.join("/")
}

/// Local name of an imported package.
fn alias(package: &Package) -> String {
    escape(
        &namespace_segments(&package.namespace, None).join("_"),
        Language::JavaScript,
    )
}

fn property_idents<'f>(fields: impl IntoIterator<Item = &'f Field>) -> Vec<String> {
    field_idents(fields, Casing::LowerSnake, Language::JavaScript)
}

fn integer_bounds(primitive: Primitive) -> (&'static str, &'static str) {
    match primitive {
        Primitive::U32 => ("0", "4294967295"),
        Primitive::I32 => ("-2147483648", "2147483647"),
        Primitive::U64 => ("0", "Number.MAX_SAFE_INTEGER"),
        _ => ("Number.MIN_SAFE_INTEGER", "Number.MAX_SAFE_INTEGER"),
    }
}

struct Emitter<'a> {
    cx: Context<'a>,
    fragment: Fragment,
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

    /// Dotted path of a declaration within its own module, e.g. `Outer.Inner`.
    fn local_path(&self, id: DeclId) -> String {
        self.cx
            .schema
            .decl_path(id)
            .iter()
            .map(|name| type_ident(name, Language::JavaScript))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Class expression for a referenced declaration.
    fn class_ref(&mut self, id: DeclId) -> String {
        let path = self.local_path(id);
        if id.package == self.fragment.decl.package {
            return path;
        }
        self.fragment.imports.insert(id.package);
        format!("{}.{}", alias(self.cx.schema.package(id.package)), path)
    }

    /// Open a class declaration; nested classes become static members.
    fn open_class(&mut self, id: DeclId, path: &str, name: &str) {
        if self.cx.schema.decl(id).parent.is_none() {
            self.w.open(format!("export class {} {{", name));
        } else {
            self.w.open(format!("{} = class {} {{", path, name));
        }
    }

    fn close_class(&mut self, id: DeclId) {
        if self.cx.schema.decl(id).parent.is_none() {
            self.w.close("}");
        } else {
            self.w.close("};");
        }
    }

    fn decl(&mut self, id: DeclId) -> Result<(), EmitError> {
        let schema = self.cx.schema;
        let decl = schema.decl(id);
        let path = self.local_path(id);
        let name = type_ident(&decl.name, Language::JavaScript);

        self.w.blank();
        self.w.doc("//", &decl.doc);
        match &decl.kind {
            DeclKind::Type(body) => {
                let fields: Vec<&Field> = body.fields.iter().collect();
                self.open_class(id, &path, &name);
                self.object_members(id, &name, &fields, None)?;
                self.close_class(id);
            }
            DeclKind::Tuple(body) => {
                let fields: Vec<&Field> = body.fields.iter().collect();
                self.open_class(id, &path, &name);
                self.tuple_members(id, &name, &fields)?;
                self.close_class(id);
            }
            DeclKind::Interface(body) => {
                self.open_class(id, &path, &name);
                self.interface_decode(id, &path, &name, body);
                self.close_class(id);
                for sub_type in &body.sub_types {
                    let fields: Vec<&Field> = body.fields_of(sub_type).collect();
                    let sub_name = type_ident(&sub_type.name, Language::JavaScript);
                    let tag = match &body.strategy {
                        SubTypeStrategy::Tagged { tag } => Some((tag.as_str(), sub_type.literal.as_str())),
                        SubTypeStrategy::Untagged => None,
                    };
                    self.w.blank();
                    self.w.doc("//", &sub_type.doc);
                    self.w
                        .open(format!("{}.{} = class {} {{", path, sub_name, sub_name));
                    self.object_members(id, &sub_name, &fields, tag)?;
                    self.w.close("};");
                }
            }
            DeclKind::Enum(body) => {
                self.open_class(id, &path, &name);
                self.enum_members(id, &name, body)?;
                self.close_class(id);
                self.enum_statics(&path, body);
            }
            DeclKind::Service(_) => return Err(self.unsupported(id, "services")),
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Members
    // ------------------------------------------------------------------

    fn constructor(&mut self, idents: &[String]) {
        self.w
            .open(format!("constructor({}) {{", idents.join(", ")));
        for ident in idents {
            self.w.line(format!("this.{0} = {0};", ident));
        }
        self.w.close("}");
    }

    /// Members of a class encoded as a JSON object.
    ///
    /// `tag` is the discriminator key and literal written by sub-types of
    /// tagged interfaces.
    fn object_members(
        &mut self,
        owner: DeclId,
        name: &str,
        fields: &[&Field],
        tag: Option<(&str, &str)>,
    ) -> Result<(), EmitError> {
        let idents = property_idents(fields.iter().copied());
        self.constructor(&idents);
        self.w.blank();

        self.w.open("static decode(data) {");
        self.w.line(format!("_object({}, data);", quote(name)));
        for (field, ident) in fields.iter().zip(&idents) {
            let key = quote(&field.json_name);
            let local = format!("v_{}", ident);
            let value = self.decode_expr(owner, &field.ty, &local, &key, 0)?;
            self.w.blank();
            self.w.line(format!("let {} = data[{}];", local, key));
            self.w.blank();
            if field.optional {
                self.w.open(format!("if (_present(data, {})) {{", key));
                self.w.line(format!("{} = {};", local, value));
                self.w.middle("} else {");
                self.w.line(format!("{} = null;", local));
                self.w.close("}");
            } else {
                self.w.open(format!("if (!_present(data, {})) {{", key));
                self.w
                    .line(format!("throw new Error({} + \": required field\");", key));
                self.w.close("}");
                self.w.blank();
                self.w.line(format!("{} = {};", local, value));
            }
        }
        let locals: Vec<String> = idents.iter().map(|i| format!("v_{}", i)).collect();
        self.w.blank();
        self.w
            .line(format!("return new {}({});", name, locals.join(", ")));
        self.w.close("}");
        self.w.blank();

        let placement = self.cx.options.discriminator_placement;
        self.w.open("encode() {");
        self.w.line("const data = {};");
        if let Some((key, literal)) = tag
            && placement == DiscriminatorPlacement::First
        {
            self.w.blank();
            self.w
                .line(format!("data[{}] = {};", quote(key), quote(literal)));
        }
        for (field, ident) in fields.iter().zip(&idents) {
            let key = quote(&field.json_name);
            let this = format!("this.{}", ident);
            let value = self.encode_expr(owner, &field.ty, &this, 0)?;
            self.w.blank();
            if field.optional {
                self.w
                    .open(format!("if ({0} !== null && {0} !== undefined) {{", this));
                self.w.line(format!("data[{}] = {};", key, value));
                self.w.close("}");
            } else {
                self.w
                    .open(format!("if ({0} === null || {0} === undefined) {{", this));
                self.w.line(format!(
                    "throw new Error({} + \": is a required field\");",
                    key
                ));
                self.w.close("}");
                self.w.blank();
                self.w.line(format!("data[{}] = {};", key, value));
            }
        }
        if let Some((key, literal)) = tag
            && placement == DiscriminatorPlacement::Last
        {
            self.w.blank();
            self.w
                .line(format!("data[{}] = {};", quote(key), quote(literal)));
        }
        self.w.blank();
        self.w.line("return data;");
        self.w.close("}");

        self.value_members(name, fields, &idents);
        Ok(())
    }

    /// Members of a class encoded as a JSON array.
    fn tuple_members(&mut self, owner: DeclId, name: &str, fields: &[&Field]) -> Result<(), EmitError> {
        let idents = property_idents(fields.iter().copied());
        self.constructor(&idents);
        self.w.blank();

        self.w.open("static decode(data) {");
        self.w.open("if (!Array.isArray(data)) {");
        self.w
            .line(format!("_fail({}, \"array\", data);", quote(name)));
        self.w.close("}");
        for (index, ident) in idents.iter().enumerate() {
            let field = fields[index];
            let key = quote(&format!("[{}]", index));
            let value = self.decode_expr(owner, &field.ty, &format!("data[{}]", index), &key, 0)?;
            self.w.blank();
            self.w.open(format!("if (data.length <= {}) {{", index));
            self.w
                .line(format!("throw new Error({} + \": required field\");", key));
            self.w.close("}");
            self.w.blank();
            self.w.line(format!("const v_{} = {};", ident, value));
        }
        let locals: Vec<String> = idents.iter().map(|i| format!("v_{}", i)).collect();
        self.w.blank();
        self.w
            .line(format!("return new {}({});", name, locals.join(", ")));
        self.w.close("}");
        self.w.blank();

        let mut values = Vec::with_capacity(fields.len());
        for (field, ident) in fields.iter().zip(&idents) {
            values.push(self.encode_expr(owner, &field.ty, &format!("this.{}", ident), 0)?);
        }
        self.w.open("encode() {");
        self.w.line(format!("return [{}];", values.join(", ")));
        self.w.close("}");

        self.value_members(name, fields, &idents);
        Ok(())
    }

    /// `equals`, `hashCode` and `toString`.
    fn value_members(&mut self, name: &str, fields: &[&Field], idents: &[String]) {
        self.w.blank();
        self.w.open("equals(other) {");
        self.w.open(format!("if (!(other instanceof {})) {{", name));
        self.w.line("return false;");
        self.w.close("}");
        for ident in idents {
            self.w.blank();
            self.w
                .open(format!("if (!_equals(this.{0}, other.{0})) {{", ident));
            self.w.line("return false;");
            self.w.close("}");
        }
        self.w.blank();
        self.w.line("return true;");
        self.w.close("}");
        self.w.blank();

        self.w.open("hashCode() {");
        self.w.line("let result = 1;");
        for ident in idents {
            self.w
                .line(format!("result = (result * 31 + _hash(this.{})) | 0;", ident));
        }
        self.w.line("return result;");
        self.w.close("}");
        self.w.blank();

        let parts: Vec<String> = fields
            .iter()
            .zip(idents)
            .map(|(field, ident)| format!("\"{}=\" + String(this.{})", field.name, ident))
            .collect();
        self.w.open("toString() {");
        if parts.is_empty() {
            self.w.line(format!("return \"{}()\";", name));
        } else {
            self.w.line(format!(
                "return \"{}(\" + {} + \")\";",
                name,
                parts.join(" + \", \" + ")
            ));
        }
        self.w.close("}");
    }

    fn interface_decode(&mut self, id: DeclId, path: &str, name: &str, body: &InterfaceBody) {
        self.w.open("static decode(data) {");
        self.w.line(format!("_object({}, data);", quote(name)));
        self.w.blank();
        match &body.strategy {
            SubTypeStrategy::Tagged { tag } => {
                self.w.line(format!("const tag = data[{}];", quote(tag)));
                self.w.blank();
                self.w.open("switch (tag) {");
                for sub_type in &body.sub_types {
                    self.w.line(format!("case {}:", quote(&sub_type.literal)));
                    self.w.line(format!(
                        "  return {}.{}.decode(data);",
                        path,
                        type_ident(&sub_type.name, Language::JavaScript)
                    ));
                }
                self.w.line("default:");
                self.w
                    .line("  throw new Error(\"unknown variant: \" + JSON.stringify(tag));");
                self.w.close("}");
            }
            SubTypeStrategy::Untagged => {
                for sub_type in &body.sub_types {
                    let checks: Vec<String> = body
                        .fields_of(sub_type)
                        .filter(|f| f.is_required())
                        .map(|f| format!("_present(data, {})", quote(&f.json_name)))
                        .collect();
                    let condition = if checks.is_empty() {
                        "true".to_string()
                    } else {
                        checks.join(" && ")
                    };
                    self.w.open(format!("if ({}) {{", condition));
                    self.w.line(format!(
                        "return {}.{}.decode(data);",
                        path,
                        type_ident(&sub_type.name, Language::JavaScript)
                    ));
                    self.w.close("}");
                    self.w.blank();
                }
                self.w.line(format!(
                    "throw new Error({});",
                    quote(&format!(
                        "{}: no sub-type matches the fields present",
                        display_path(self.cx.schema, id)
                    ))
                ));
            }
        }
        self.w.close("}");
    }

    fn enum_members(&mut self, id: DeclId, name: &str, body: &EnumBody) -> Result<(), EmitError> {
        for member in &body.members {
            if let EnumValue::Number(value) = member.value
                && value.abs() > MAX_SAFE_INTEGER
            {
                return Err(self.unsupported(id, "enum values beyond the safe integer range"));
            }
        }

        self.constructor(&["name".to_string(), "value".to_string()]);
        self.w.blank();
        self.w.open("static decode(data) {");
        self.w.open(format!("for (const member of {}.values) {{", name));
        self.w.open("if (member.value === data) {");
        self.w.line("return member;");
        self.w.close("}");
        self.w.close("}");
        self.w.blank();
        self.w.line(format!(
            "throw new Error({} + JSON.stringify(data));",
            quote(&format!("{}: no value matching: ", name))
        ));
        self.w.close("}");
        self.w.blank();
        self.w.open("encode() {");
        self.w.line("return this.value;");
        self.w.close("}");
        self.w.blank();
        self.w.open("hashCode() {");
        self.w.line("return _hash(this.name);");
        self.w.close("}");
        self.w.blank();
        self.w.open("toString() {");
        self.w.line("return this.name;");
        self.w.close("}");
        Ok(())
    }

    fn enum_statics(&mut self, path: &str, body: &EnumBody) {
        let members = escape_all(
            body.members.iter().map(|m| m.name.as_str()),
            Casing::UpperCamel,
            Language::JavaScript,
        );
        self.w.blank();
        for (member, ident) in body.members.iter().zip(&members) {
            let value = match &member.value {
                EnumValue::String(value) => quote(value),
                EnumValue::Number(value) => value.to_string(),
            };
            self.w.line(format!(
                "{}.{} = new {}({}, {});",
                path,
                ident,
                path,
                quote(&member.name),
                value
            ));
        }
        let values: Vec<String> = members.iter().map(|m| format!("{}.{}", path, m)).collect();
        self.w
            .line(format!("{}.values = [{}];", path, values.join(", ")));
    }

    // ------------------------------------------------------------------
    // Value conversion
    // ------------------------------------------------------------------

    /// Expression decoding the JSON value `value`; `name` is a string literal for errors.
    fn decode_expr(
        &mut self,
        owner: DeclId,
        ty: &TypeRef,
        value: &str,
        name: &str,
        depth: usize,
    ) -> Result<String, EmitError> {
        let item = format!("v{}", depth);
        Ok(match ty {
            TypeRef::Primitive(primitive) => match primitive {
                Primitive::String | Primitive::DateTime | Primitive::Bytes => {
                    format!("_string({}, {})", name, value)
                }
                Primitive::Boolean => format!("_boolean({}, {})", name, value),
                Primitive::Float | Primitive::Double => format!("_number({}, {})", name, value),
                Primitive::Any => value.to_string(),
                integer => {
                    let (min, max) = integer_bounds(*integer);
                    format!("_integer({}, {}, {}, {})", name, value, min, max)
                }
            },
            TypeRef::Decl(id) => format!("{}.decode({})", self.class_ref(*id), value),
            TypeRef::Array(inner) => format!(
                "_array({}, {}, ({}) => {})",
                name,
                value,
                item,
                self.decode_expr(owner, inner, &item, name, depth + 1)?
            ),
            TypeRef::Map(key, inner) => {
                let key = match key.as_ref() {
                    TypeRef::Primitive(p) if p.is_integer() => {
                        let (min, max) = integer_bounds(*p);
                        format!("(k) => _integerKey({}, k, {}, {})", name, min, max)
                    }
                    _ => "(k) => k".to_string(),
                };
                format!(
                    "_map({}, {}, {}, ({}) => {})",
                    name,
                    value,
                    key,
                    item,
                    self.decode_expr(owner, inner, &item, name, depth + 1)?
                )
            }
            TypeRef::Tuple(items) => {
                let mut decoders = Vec::with_capacity(items.len());
                for ty in items {
                    decoders.push(format!(
                        "({}) => {}",
                        item,
                        self.decode_expr(owner, ty, &item, name, depth + 1)?
                    ));
                }
                format!("_tuple({}, {}, [{}])", name, value, decoders.join(", "))
            }
        })
    }

    /// Expression encoding `value` into a JSON value.
    fn encode_expr(
        &mut self,
        owner: DeclId,
        ty: &TypeRef,
        value: &str,
        depth: usize,
    ) -> Result<String, EmitError> {
        let item = format!("v{}", depth);
        Ok(match ty {
            TypeRef::Primitive(_) => value.to_string(),
            TypeRef::Decl(_) => format!("{}.encode()", value),
            TypeRef::Array(inner) => format!(
                "{}.map(({}) => {})",
                value,
                item,
                self.encode_expr(owner, inner, &item, depth + 1)?
            ),
            TypeRef::Map(_, inner) => format!(
                "_encodeMap({}, ({}) => {})",
                value,
                item,
                self.encode_expr(owner, inner, &item, depth + 1)?
            ),
            TypeRef::Tuple(items) => {
                let mut values = Vec::with_capacity(items.len());
                for (index, ty) in items.iter().enumerate() {
                    values.push(self.encode_expr(
                        owner,
                        ty,
                        &format!("{}[{}]", value, index),
                        depth + 1,
                    )?);
                }
                format!("[{}]", values.join(", "))
            }
        })
    }
}
