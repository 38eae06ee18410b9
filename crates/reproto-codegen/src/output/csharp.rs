//! C# backend.
//!
//! Emits one file per top-level declaration, `Foo/Bar/_1_0_0/Thing.cs`, with
//! nested declarations as nested classes. Serialization goes through
//! Newtonsoft.Json attributes:
//!
//! - types are `[JsonObject]` classes with a `[JsonConstructor]`;
//! - tuples and untagged interfaces carry a custom `JsonConverter`;
//! - tagged interfaces use `JsonSubtypes` keyed on the discriminator;
//! - enums are `StringEnumConverter` enums or enums over an integer type.

use crate::common::{display_path, field_idents, namespace_segments, type_ident};
use crate::error::EmitError;
use crate::traits::{Backend, Context, Fragment};
use crate::writer::{CodeWriter, quote};
use reproto_core::{
    DeclId, DeclKind, DiscriminatorPlacement, EnumType, EnumValue, Field, Package, Primitive,
    ServiceBody, SubTypeStrategy, TypeRef,
};
use reproto_naming::{Casing, Language, escape_all};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Static instance of the C# backend for registry.
pub static CSHARP_BACKEND: CSharpBackend = CSharpBackend;

const NAME: &str = "csharp";

pub struct CSharpBackend;

impl Backend for CSharpBackend {
    fn name(&self) -> &'static str {
        NAME
    }

    fn language(&self) -> &'static str {
        "C#"
    }

    fn extension(&self) -> &'static str {
        "cs"
    }

    fn path(&self, cx: &Context<'_>, decl: DeclId) -> PathBuf {
        let package = cx.schema.package(decl.package);
        let mut path: PathBuf = namespace_segments(&package.namespace, Some(Casing::UpperCamel))
            .into_iter()
            .collect();
        path.push(format!(
            "{}.cs",
            type_ident(&cx.schema.decl(decl).name, Language::CSharp)
        ));
        path
    }

    fn emit_decl(&self, cx: &Context<'_>, decl: DeclId) -> Result<Fragment, EmitError> {
        let mut emitter = Emitter {
            cx: *cx,
            fragment: Fragment::new(decl),
            w: CodeWriter::new("    "),
        };
        emitter.require("Newtonsoft.Json");
        emitter.require("System");
        emitter.decl(decl)?;
        emitter.fragment.text = emitter.w.finish();
        Ok(emitter.fragment)
    }

    fn assemble(&self, cx: &Context<'_>, _path: &Path, fragments: &[Fragment]) -> String {
        let Some(first) = fragments.first() else {
            return String::new();
        };
        let package = cx.schema.package(first.decl.package);
        let usings: BTreeSet<&String> = fragments.iter().flat_map(|f| &f.requires).collect();

        let mut w = CodeWriter::new("    ");
        for using in usings {
            w.line(format!("using {};", using));
        }
        w.blank();
        w.open(format!("namespace {} {{", namespace(package)));
        for (index, fragment) in fragments.iter().enumerate() {
            if index > 0 {
                w.blank();
            }
            w.embed(&fragment.text);
        }
        w.close("}");
        w.finish()
    }
}

fn namespace(package: &Package) -> String {
    namespace_segments(&package.namespace, Some(Casing::UpperCamel)).join(".")
}

fn property_idents<'f>(fields: impl IntoIterator<Item = &'f Field>) -> Vec<String> {
    field_idents(fields, Casing::LowerCamel, Language::CSharp)
}

/// How a field's value participates in equality and hashing.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Shape {
    /// Value types, including nullable ones.
    Value,
    /// Reference types compared with `Equals`.
    Object,
    /// `List<T>` and `byte[]`, compared element-wise.
    Sequence,
    /// `Dictionary<K, V>`.
    Map,
}

struct Emitter<'a> {
    cx: Context<'a>,
    fragment: Fragment,
    w: CodeWriter,
}

impl<'a> Emitter<'a> {
    fn require(&mut self, namespace: &str) {
        self.fragment.requires.insert(namespace.to_string());
    }

    fn unsupported(&self, id: DeclId, feature: &str) -> EmitError {
        EmitError::unsupported(
            NAME,
            display_path(self.cx.schema, id),
            feature,
            self.cx.schema.decl(id).span,
        )
    }

    /// Name of a declaration as seen from the file being emitted.
    fn type_name(&mut self, id: DeclId) -> String {
        let path: Vec<String> = self
            .cx
            .schema
            .decl_path(id)
            .iter()
            .map(|name| type_ident(name, Language::CSharp))
            .collect();
        if id.package == self.fragment.decl.package {
            return path.join(".");
        }
        self.fragment.imports.insert(id.package);
        format!(
            "global::{}.{}",
            namespace(self.cx.schema.package(id.package)),
            path.join(".")
        )
    }

    fn ty(&mut self, owner: DeclId, ty: &TypeRef) -> Result<String, EmitError> {
        Ok(match ty {
            TypeRef::Primitive(primitive) => match primitive {
                Primitive::Boolean => "bool",
                Primitive::String => "String",
                Primitive::DateTime => "DateTime",
                Primitive::Bytes => "byte[]",
                Primitive::Any => "Object",
                Primitive::U32 => "uint",
                Primitive::U64 => "ulong",
                Primitive::I32 => "int",
                Primitive::I64 => "long",
                Primitive::Float => "float",
                Primitive::Double => "double",
            }
            .to_string(),
            TypeRef::Decl(id) => self.type_name(*id),
            TypeRef::Array(inner) => {
                self.require("System.Collections.Generic");
                format!("List<{}>", self.ty(owner, inner)?)
            }
            TypeRef::Map(key, value) => {
                self.require("System.Collections.Generic");
                let key = self.ty(owner, key)?;
                let value = self.ty(owner, value)?;
                format!("Dictionary<{}, {}>", key, value)
            }
            TypeRef::Tuple(_) => return Err(self.unsupported(owner, "inline tuple types")),
        })
    }

    fn shape(&self, ty: &TypeRef) -> Shape {
        match ty {
            TypeRef::Primitive(Primitive::String | Primitive::Any) => Shape::Object,
            TypeRef::Primitive(Primitive::Bytes) => Shape::Sequence,
            TypeRef::Primitive(_) => Shape::Value,
            TypeRef::Decl(id) => match self.cx.schema.decl(*id).kind {
                DeclKind::Enum(_) => Shape::Value,
                _ => Shape::Object,
            },
            TypeRef::Array(_) => Shape::Sequence,
            TypeRef::Map(_, _) => Shape::Map,
            TypeRef::Tuple(_) => Shape::Object,
        }
    }

    /// Property type, nullable for optional value types.
    fn field_type(&mut self, owner: DeclId, field: &Field) -> Result<String, EmitError> {
        let ty = self.ty(owner, &field.ty)?;
        if field.optional && self.shape(&field.ty) == Shape::Value {
            Ok(format!("{}?", ty))
        } else {
            Ok(ty)
        }
    }

    fn json_property(field: &Field) -> String {
        if field.optional {
            format!("[JsonProperty({})]", quote(&field.json_name))
        } else {
            format!(
                "[JsonProperty({}, Required = Required.Always)]",
                quote(&field.json_name)
            )
        }
    }

    fn decl(&mut self, id: DeclId) -> Result<(), EmitError> {
        let schema = self.cx.schema;
        let decl = schema.decl(id);
        if let Some(parent) = decl.parent {
            if schema.package(id.package).decls[parent].name == decl.name {
                return Err(self.unsupported(id, "a nested declaration named like its parent"));
            }
        }

        let name = type_ident(&decl.name, Language::CSharp);
        self.w.doc("///", &decl.doc);

        match &decl.kind {
            DeclKind::Type(body) => {
                let fields: Vec<&Field> = body.fields.iter().collect();
                self.w
                    .line("[JsonObject(ItemNullValueHandling = NullValueHandling.Ignore)]");
                self.w.open(format!("public class {} {{", name));
                self.class_members(id, &decl.name, &name, &fields, "")?;
                self.children(id)?;
                self.w.close("}");
            }
            DeclKind::Tuple(body) => {
                let fields: Vec<&Field> = body.fields.iter().collect();
                let path = self.type_name(id);
                self.w.line(format!(
                    "[JsonConverter(typeof({}.Json_Net_Converter))]",
                    path
                ));
                self.w.open(format!("public class {} {{", name));
                self.class_members(id, &decl.name, &name, &fields, "")?;
                self.w.blank();
                self.tuple_converter(id, &path, &fields)?;
                self.children(id)?;
                self.w.close("}");
            }
            DeclKind::Interface(body) => {
                let path = self.type_name(id);
                match &body.strategy {
                    SubTypeStrategy::Tagged { tag } => {
                        self.require("JsonSubTypes");
                        let mut header = format!("[JsonConverter(typeof(JsonSubtypes), {})]", quote(tag));
                        for sub_type in &body.sub_types {
                            header.push_str(&format!(
                                "[JsonSubtypes.KnownSubType(typeof({}.{}), {})]",
                                path,
                                type_ident(&sub_type.name, Language::CSharp),
                                quote(&sub_type.literal)
                            ));
                        }
                        self.w.line(header);
                        self.w.open(format!("public abstract class {} {{", name));
                        let order = match self.cx.options.discriminator_placement {
                            DiscriminatorPlacement::First => "-2",
                            DiscriminatorPlacement::Last => "int.MaxValue",
                        };
                        self.w.line(format!(
                            "[JsonProperty({}, Required = Required.DisallowNull, Order = {})]",
                            quote(tag),
                            order
                        ));
                        self.w.open("private String TypeField {");
                        self.w.line("get;");
                        self.w.close("}");
                        self.w.blank();
                        self.w.open(format!("public {}(String TypeField) {{", name));
                        self.w.line("this.TypeField = TypeField;");
                        self.w.close("}");
                    }
                    SubTypeStrategy::Untagged => {
                        self.w
                            .line(format!("[JsonConverter(typeof({}.Json_Net_Converter))]", path));
                        self.w.open(format!("public abstract class {} {{", name));
                        self.untagged_converter(id, &path)?;
                    }
                }

                for sub_type in &body.sub_types {
                    let sub_name = type_ident(&sub_type.name, Language::CSharp);
                    let fields: Vec<&Field> = body.fields_of(sub_type).collect();
                    let base_call = match &body.strategy {
                        SubTypeStrategy::Tagged { .. } => {
                            format!(" : base({})", quote(&sub_type.literal))
                        }
                        SubTypeStrategy::Untagged => String::new(),
                    };
                    self.w.blank();
                    self.w.doc("///", &sub_type.doc);
                    self.w
                        .line("[JsonObject(ItemNullValueHandling = NullValueHandling.Ignore)]");
                    self.w
                        .open(format!("public class {} : {} {{", sub_name, name));
                    self.class_members(id, &sub_type.name, &sub_name, &fields, &base_call)?;
                    self.w.close("}");
                }
                self.children(id)?;
                self.w.close("}");
            }
            DeclKind::Enum(body) => {
                let members = escape_all(
                    body.members.iter().map(|m| m.name.as_str()),
                    Casing::UpperCamel,
                    Language::CSharp,
                );
                if body.ty == EnumType::String {
                    self.require("Newtonsoft.Json.Converters");
                    self.require("System.Runtime.Serialization");
                    self.w.line("[JsonConverter(typeof(StringEnumConverter))]");
                    self.w.open(format!("public enum {} {{", name));
                } else {
                    let underlying = match body.ty {
                        EnumType::U32 => "uint",
                        EnumType::U64 => "ulong",
                        EnumType::I32 => "int",
                        _ => "long",
                    };
                    self.w
                        .open(format!("public enum {} : {} {{", name, underlying));
                }
                for (member, ident) in body.members.iter().zip(&members) {
                    self.w.doc("///", &member.doc);
                    match &member.value {
                        EnumValue::String(value) => {
                            self.w.line(format!("[EnumMember(Value = {})]", quote(value)));
                            self.w.line(format!("{},", ident));
                        }
                        EnumValue::Number(value) => self.w.line(format!("{} = {},", ident, value)),
                    }
                }
                self.w.close("}");
            }
            DeclKind::Service(body) => {
                self.w.open(format!("public interface {} {{", name));
                self.service(id, body)?;
                self.children(id)?;
                self.w.close("}");
            }
        }
        Ok(())
    }

    fn children(&mut self, id: DeclId) -> Result<(), EmitError> {
        let schema = self.cx.schema;
        let decl = schema.decl(id);
        for (child, _) in schema.package(id.package).children(decl) {
            self.w.blank();
            self.decl(child)?;
        }
        Ok(())
    }

    /// Properties, constructor, `Equals`, `GetHashCode` and `ToString`.
    fn class_members(
        &mut self,
        owner: DeclId,
        display: &str,
        name: &str,
        fields: &[&Field],
        base_call: &str,
    ) -> Result<(), EmitError> {
        let idents = property_idents(fields.iter().copied());
        let mut types = Vec::with_capacity(fields.len());
        for field in fields {
            types.push(self.field_type(owner, field)?);
        }

        for ((field, ident), ty) in fields.iter().zip(&idents).zip(&types) {
            self.w.doc("///", &field.doc);
            self.w.line(Self::json_property(field));
            self.w.open(format!("public {} {} {{", ty, ident));
            self.w.line("get;");
            self.w.close("}");
            self.w.blank();
        }

        self.w.line("[JsonConstructor]");
        if fields.is_empty() {
            self.w.open(format!("public {}(){} {{", name, base_call));
        } else {
            self.w.open(format!("public {}(", name));
            for (index, ((field, ident), ty)) in fields.iter().zip(&idents).zip(&types).enumerate() {
                let comma = if index + 1 < fields.len() { "," } else { "" };
                self.w.line(format!(
                    "{} {} {}{}",
                    Self::json_property(field),
                    ty,
                    ident,
                    comma
                ));
            }
            self.w.middle(format!("){} {{", base_call));
            for ident in &idents {
                self.w.line(format!("this.{0} = {0};", ident));
            }
        }
        self.w.close("}");
        self.w.blank();

        self.equals(name, fields, &idents);
        self.w.blank();
        self.hash_code(fields, &idents);
        self.w.blank();
        self.to_string(display, fields, &idents);
        Ok(())
    }

    fn equals(&mut self, name: &str, fields: &[&Field], idents: &[String]) {
        self.w.open("public override bool Equals(Object other) {");
        self.w.line(format!("{0} o = other as {0};", name));
        self.w.blank();
        self.w.open("if (o == null) {");
        self.w.line("return false;");
        self.w.close("}");
        self.w.blank();

        for (field, ident) in fields.iter().zip(idents) {
            let shape = self.shape(&field.ty);
            let equal = match shape {
                Shape::Value | Shape::Object => format!("this.{0}.Equals(o.{0})", ident),
                Shape::Sequence => {
                    self.require("System.Linq");
                    format!("this.{0}.SequenceEqual(o.{0})", ident)
                }
                Shape::Map => {
                    self.require("System.Linq");
                    format!(
                        "this.{0}.Count == o.{0}.Count && !this.{0}.Except(o.{0}).Any()",
                        ident
                    )
                }
            };

            if shape == Shape::Value {
                self.w.open(format!("if (!{}) {{", equal));
                self.w.line("return false;");
                self.w.close("}");
            } else {
                self.w.open(format!("if (this.{} == null) {{", ident));
                self.w.open(format!("if (o.{} != null) {{", ident));
                self.w.line("return false;");
                self.w.close("}");
                self.w.middle("} else {");
                self.w.open(format!("if (!({})) {{", equal));
                self.w.line("return false;");
                self.w.close("}");
                self.w.close("}");
            }
            self.w.blank();
        }

        self.w.line("return true;");
        self.w.close("}");
    }

    fn hash_code(&mut self, fields: &[&Field], idents: &[String]) {
        self.w.open("public override int GetHashCode() {");
        self.w.line("int result = 1;");
        for (field, ident) in fields.iter().zip(idents) {
            let hash = match (self.shape(&field.ty), &field.ty) {
                (Shape::Value, _) => format!("this.{}.GetHashCode()", ident),
                (Shape::Sequence, TypeRef::Primitive(Primitive::Bytes)) => {
                    format!("(this.{0} == null ? 0 : this.{0}.Length)", ident)
                }
                (Shape::Sequence | Shape::Map, _) => {
                    format!("(this.{0} == null ? 0 : this.{0}.Count)", ident)
                }
                (Shape::Object, _) => {
                    format!("(this.{0} == null ? 0 : this.{0}.GetHashCode())", ident)
                }
            };
            self.w.line(format!("result = result * 31 + {};", hash));
        }
        self.w.line("return result;");
        self.w.close("}");
    }

    fn to_string(&mut self, display: &str, fields: &[&Field], idents: &[String]) {
        self.require("System.Text");
        self.w.open("public override String ToString() {");
        self.w.line("StringBuilder b = new StringBuilder();");
        self.w.blank();
        self.w.line(format!("b.Append({});", quote(&format!("{}(", display))));
        for (index, (field, ident)) in fields.iter().zip(idents).enumerate() {
            if index > 0 {
                self.w.line("b.Append(\", \");");
            }
            self.w
                .line(format!("b.Append({});", quote(&format!("{}=", field.name))));
            self.w.line(format!("b.Append(this.{});", ident));
        }
        self.w.line("b.Append(\")\");");
        self.w.blank();
        self.w.line("return b.ToString();");
        self.w.close("}");
    }

    fn tuple_converter(&mut self, owner: DeclId, path: &str, fields: &[&Field]) -> Result<(), EmitError> {
        self.require("Newtonsoft.Json.Linq");
        self.require("System.Collections.Generic");
        let idents = property_idents(fields.iter().copied());

        self.w.open("public class Json_Net_Converter : JsonConverter {");
        self.w
            .open("public override bool CanConvert(System.Type objectType) {");
        self.w.line(format!("return objectType == typeof({});", path));
        self.w.close("}");
        self.w.blank();

        self.w.open(
            "public override void WriteJson(JsonWriter writer, Object obj, JsonSerializer serializer) {",
        );
        self.w.line(format!("{0} o = ({0})obj;", path));
        self.w.line("JArray array = new JArray();");
        self.w.blank();
        for ident in &idents {
            self.w
                .line(format!("array.Add(JToken.FromObject(o.{}, serializer));", ident));
        }
        self.w.blank();
        self.w.line("array.WriteTo(writer);");
        self.w.close("}");
        self.w.blank();

        self.w.open("public override Object ReadJson(JsonReader reader, System.Type objectType, Object existingValue, JsonSerializer serializer) {");
        self.w.line("JArray array = JArray.Load(reader);");
        self.w
            .line("IEnumerator<JToken> enumerator = array.GetEnumerator();");
        let mut locals = Vec::with_capacity(fields.len());
        for (index, (field, ident)) in fields.iter().zip(&idents).enumerate() {
            let ty = self.field_type(owner, field)?;
            let local = format!("f_{}", ident);
            self.w.blank();
            self.w.open("if (!enumerator.MoveNext()) {");
            self.w.line(format!(
                "throw new InvalidOperationException(\"missing field: {}\");",
                index
            ));
            self.w.close("}");
            self.w.blank();
            self.w.line(format!(
                "{} {} = enumerator.Current.ToObject<{}>(serializer);",
                ty, local, ty
            ));
            locals.push(local);
        }
        self.w.blank();
        self.w
            .line(format!("return new {}({});", path, locals.join(", ")));
        self.w.close("}");
        self.w.close("}");
        Ok(())
    }

    fn untagged_converter(&mut self, id: DeclId, path: &str) -> Result<(), EmitError> {
        self.require("Newtonsoft.Json.Linq");
        let schema = self.cx.schema;
        let DeclKind::Interface(body) = &schema.decl(id).kind else {
            return Ok(());
        };

        self.w.open("public class Json_Net_Converter : JsonConverter {");
        self.w.line("[ThreadStatic]");
        self.w.line("private static bool _isInsideRead;");
        self.w.blank();
        self.w.open("public override bool CanWrite {");
        self.w.line("get { return false; }");
        self.w.close("}");
        self.w.blank();
        self.w.open("public override bool CanRead {");
        self.w.line("get { return !_isInsideRead; }");
        self.w.close("}");
        self.w.blank();
        self.w
            .open("public override bool CanConvert(System.Type objectType) {");
        self.w.line("return false;");
        self.w.close("}");
        self.w.blank();
        self.w.open(
            "public override void WriteJson(JsonWriter writer, Object obj, JsonSerializer serializer) {",
        );
        self.w
            .line("throw new InvalidOperationException(\"not implemented\");");
        self.w.close("}");
        self.w.blank();
        self.w.open("public override Object ReadJson(JsonReader reader, System.Type objectType, Object existingValue, JsonSerializer serializer) {");
        self.w.line("JObject o = JObject.Load(reader);");

        for sub_type in &body.sub_types {
            let keys: Vec<String> = body
                .fields_of(sub_type)
                .filter(|f| f.is_required())
                .map(|f| format!("o.ContainsKey({})", quote(&f.json_name)))
                .collect();
            let condition = if keys.is_empty() {
                "true".to_string()
            } else {
                keys.join(" && ")
            };
            self.w.blank();
            self.w.open(format!("if ({}) {{", condition));
            self.w.line("_isInsideRead = true;");
            self.w.open("try {");
            self.w.line(format!(
                "return serializer.Deserialize(o.CreateReader(), typeof({}.{}));",
                path,
                type_ident(&sub_type.name, Language::CSharp)
            ));
            self.w.middle("} finally {");
            self.w.line("_isInsideRead = false;");
            self.w.close("}");
            self.w.close("}");
        }

        self.w.blank();
        self.w.line(
            "throw new InvalidOperationException(\"no sub-type matches the fields present\");",
        );
        self.w.close("}");
        self.w.close("}");
        Ok(())
    }

    fn service(&mut self, id: DeclId, body: &ServiceBody) -> Result<(), EmitError> {
        self.require("System.Threading.Tasks");
        let methods = escape_all(
            body.endpoints.iter().map(|e| e.name.as_str()),
            Casing::UpperCamel,
            Language::CSharp,
        );

        for (index, (endpoint, method)) in body.endpoints.iter().zip(&methods).enumerate() {
            if index > 0 {
                self.w.blank();
            }
            let params = escape_all(
                endpoint.arguments.iter().map(|a| a.name.as_str()),
                Casing::LowerCamel,
                Language::CSharp,
            );
            let mut arguments = Vec::with_capacity(params.len());
            for (argument, param) in endpoint.arguments.iter().zip(&params) {
                let mut ty = self.ty(id, &argument.channel.ty)?;
                if argument.channel.streaming {
                    self.require("System.Collections.Generic");
                    ty = format!("IAsyncEnumerable<{}>", ty);
                }
                arguments.push(format!("{} {}", ty, param));
            }
            let response = match &endpoint.response {
                None => "Task".to_string(),
                Some(channel) if channel.streaming => {
                    self.require("System.Collections.Generic");
                    format!("IAsyncEnumerable<{}>", self.ty(id, &channel.ty)?)
                }
                Some(channel) => format!("Task<{}>", self.ty(id, &channel.ty)?),
            };
            self.w.doc("///", &endpoint.doc);
            self.w.line(format!(
                "{} {}({});",
                response,
                method,
                arguments.join(", ")
            ));
        }
        Ok(())
    }
}
