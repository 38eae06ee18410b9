use reproto_codegen::output::{CSHARP_BACKEND, JS_BACKEND, SWIFT_BACKEND};
use reproto_codegen::{Backend, EmitError, EmitOptions, Emitted, emit};
use reproto_core::{DiscriminatorPlacement, PackageId, PackageName, Schema, Version};
use reproto_parser::parse;
use reproto_resolve::{ResolveOptions, SourceFile, resolve};
use std::path::Path;

/// Resolve `(package, version, source)` triples, one file each.
fn schema(files: &[(&str, Option<&str>, &str)]) -> Schema {
    let sources: Vec<SourceFile> = files
        .iter()
        .enumerate()
        .map(|(id, (package, version, source))| {
            let (ast, errors) = parse(id, source);
            assert!(errors.is_empty(), "parse errors: {:?}", errors);
            SourceFile {
                file: id,
                package: PackageName::parse(package).unwrap(),
                version: version.map(|v| Version::parse(v).unwrap()),
                ast,
            }
        })
        .collect();
    resolve(&sources, &ResolveOptions::default())
        .expect("resolution failed")
        .schema
}

fn run(schema: &Schema, backend: &dyn Backend) -> Emitted {
    emit(schema, &[backend], &EmitOptions::default())
}

fn file<'a>(emitted: &'a Emitted, backend: &str, path: &str) -> &'a str {
    emitted
        .files
        .iter()
        .find(|f| f.backend == backend && f.path == Path::new(path))
        .map(|f| f.contents.as_str())
        .unwrap_or_else(|| {
            let paths: Vec<_> = emitted.files.iter().map(|f| (f.backend, &f.path)).collect();
            panic!("no {} file {}; have {:?}", backend, path, paths)
        })
}

const CROSS_PACKAGE: &[(&str, Option<&str>, &str)] = &[
    ("bar", Some("1.0.0"), "type Other { name: string; }"),
    (
        "foo",
        None,
        r#"
        use bar "^1" as bar;
        type Thing { other: bar::Other; }
        "#,
    ),
];

// ============================================================================
// C#
// ============================================================================

mod csharp {
    use super::*;

    #[test]
    fn test_type_properties() {
        let schema = schema(&[(
            "foo",
            None,
            "type Thing { name: string; count?: u32; class: string; }",
        )]);
        let emitted = run(&schema, &CSHARP_BACKEND);
        assert!(emitted.errors.is_empty());
        let text = file(&emitted, "csharp", "Foo/Thing.cs");
        assert!(text.contains("namespace Foo {"));
        assert!(text.contains("public class Thing {"));
        assert!(text.contains("[JsonProperty(\"name\", Required = Required.Always)]"));
        assert!(text.contains("public String name {"));
        assert!(text.contains("public uint? count {"));
        assert!(text.contains("public String _class {"));
        assert!(text.contains("using Newtonsoft.Json;"));
    }

    #[test]
    fn test_numeric_enum_file() {
        let schema = schema(&[("foo", None, "enum Level as u32 { Low as 1; High as 10; }")]);
        let emitted = run(&schema, &CSHARP_BACKEND);
        assert!(emitted.errors.is_empty());
        insta::assert_snapshot!(file(&emitted, "csharp", "Foo/Level.cs"), @r#"
        using Newtonsoft.Json;
        using System;

        namespace Foo {
            public enum Level : uint {
                Low = 1,
                High = 10,
            }
        }
        "#);
    }

    #[test]
    fn test_one_file_per_declaration() {
        let schema = schema(&[("foo", None, "type A {} type B { type Inner {} }")]);
        let emitted = run(&schema, &CSHARP_BACKEND);
        let paths: Vec<_> = emitted.files.iter().map(|f| f.path.clone()).collect();
        assert_eq!(paths, [Path::new("Foo/A.cs"), Path::new("Foo/B.cs")]);
        assert!(file(&emitted, "csharp", "Foo/B.cs").contains("public class Inner {"));
    }

    #[test]
    fn test_cross_package_reference() {
        let schema = schema(CROSS_PACKAGE);
        let emitted = run(&schema, &CSHARP_BACKEND);
        assert!(file(&emitted, "csharp", "Bar/_1_0_0/Other.cs").contains("namespace Bar._1_0_0 {"));
        assert!(file(&emitted, "csharp", "Foo/Thing.cs").contains("global::Bar._1_0_0.Other"));
    }

    #[test]
    fn test_tagged_interface() {
        let schema = schema(&[("foo", None, r#"interface Shape { Circle as "circle" { r: double; } }"#)]);
        let emitted = run(&schema, &CSHARP_BACKEND);
        let text = file(&emitted, "csharp", "Foo/Shape.cs");
        assert!(text.contains("[JsonSubtypes.KnownSubType(typeof(Shape.Circle), \"circle\")]"));
        assert!(text.contains("public abstract class Shape {"));
        assert!(text.contains(") : base(\"circle\") {"));
        assert!(text.contains("Order = int.MaxValue"));
        assert!(text.contains("using JsonSubTypes;"));
    }

    #[test]
    fn test_service_interface() {
        let schema = schema(&[(
            "foo",
            None,
            "service Api { get_item(id: string) -> Item; type Item {} }",
        )]);
        let emitted = run(&schema, &CSHARP_BACKEND);
        assert!(emitted.errors.is_empty());
        let text = file(&emitted, "csharp", "Foo/Api.cs");
        assert!(text.contains("public interface Api {"));
        assert!(text.contains("Task<Api.Item> GetItem(String id);"));
    }

    #[test]
    fn test_tuple_reader_locals_stay_distinct() {
        let schema = schema(&[("foo", None, "tuple T { base: string; base_: string; }")]);
        let emitted = run(&schema, &CSHARP_BACKEND);
        assert!(emitted.errors.is_empty());
        let text = file(&emitted, "csharp", "Foo/T.cs");

        let locals: Vec<&str> = text
            .lines()
            .filter(|line| line.contains(".ToObject<"))
            .filter_map(|line| line.trim().split_whitespace().nth(1))
            .collect();
        assert_eq!(locals.len(), 2);
        assert_ne!(locals[0], locals[1]);
        assert!(text.contains(&format!("return new T({}, {});", locals[0], locals[1])));
    }

    #[test]
    fn test_inline_tuple_is_unsupported() {
        let schema = schema(&[("foo", None, "type A { pair: (string, u32); } type B {}")]);
        let emitted = run(&schema, &CSHARP_BACKEND);
        assert_eq!(emitted.files.len(), 1);
        assert!(matches!(
            &emitted.errors[..],
            [EmitError::Unsupported { backend: "csharp", decl, .. }] if decl == "foo::A"
        ));
    }
}

// ============================================================================
// Swift
// ============================================================================

mod swift {
    use super::*;

    #[test]
    fn test_struct_naming() {
        let schema = schema(&[(
            "foo",
            None,
            "type Thing { first_name: string; in: u32; type Inner {} }",
        )]);
        let emitted = run(&schema, &SWIFT_BACKEND);
        assert!(emitted.errors.is_empty());
        let text = file(&emitted, "swift", "Foo.swift");
        assert!(text.starts_with("import Foundation\n"));
        assert!(text.contains(
            "public struct Foo_Thing: Equatable, Hashable, CustomStringConvertible {"
        ));
        assert!(text.contains("public let first_name: String"));
        assert!(text.contains("public let in_: UInt32"));
        assert!(text.contains("public struct Inner: Equatable"));
        assert!(text.contains("public extension Foo_Thing.Inner {"));
        assert!(text.contains("throw SerializationError.missing(\"first_name\")"));
    }

    #[test]
    fn test_one_file_per_package() {
        let schema = schema(CROSS_PACKAGE);
        let emitted = run(&schema, &SWIFT_BACKEND);
        let paths: Vec<_> = emitted.files.iter().map(|f| f.path.clone()).collect();
        assert_eq!(paths, [Path::new("Bar/_1_0_0.swift"), Path::new("Foo.swift")]);
        assert!(file(&emitted, "swift", "Foo.swift").contains("public let other: Bar__1_0_0_Other"));
    }

    #[test]
    fn test_interface_enum() {
        let schema = schema(&[("foo", None, r#"interface Shape { Circle as "circle" { r: double; } }"#)]);
        let emitted = run(&schema, &SWIFT_BACKEND);
        let text = file(&emitted, "swift", "Foo.swift");
        assert!(text.contains("public indirect enum Foo_Shape: "));
        assert!(text.contains("case circle(Foo_Shape.Circle)"));
        assert!(text.contains("return Foo_Shape.circle(try Foo_Shape.Circle.decode(json: json))"));
        assert!(text.contains("public extension Foo_Shape.Circle {"));
        assert!(!text.contains("Foo_Shape_Circle"));
        assert!(text.contains("case \"circle\":"));
    }

    #[test]
    fn test_sub_type_is_nested_in_interface() {
        let schema = schema(&[("foo", None, "interface Shape { Circle { r: double; } Square { side: double; } }")]);
        let emitted = run(&schema, &SWIFT_BACKEND);
        assert!(emitted.errors.is_empty());
        let text = file(&emitted, "swift", "Foo.swift");
        let lines: Vec<&str> = text.lines().collect();
        let open = lines
            .iter()
            .position(|line| line.starts_with("public indirect enum Foo_Shape: "))
            .unwrap();
        let close = open + lines[open..].iter().position(|line| *line == "}").unwrap();
        for sub_type in ["Circle", "Square"] {
            let header = format!("public struct {}: ", sub_type);
            let at = lines.iter().position(|line| line.trim_start().starts_with(&header)).unwrap();
            assert!(open < at && at < close, "{} is not inside Foo_Shape", sub_type);
            assert!(lines[at].starts_with(char::is_whitespace));
        }
        assert!(text.contains("case circle(Foo_Shape.Circle)"));
        assert!(text.contains("case square(Foo_Shape.Square)"));
    }

    #[test]
    fn test_streaming_endpoint_is_unsupported() {
        let schema = schema(&[("foo", None, "service Api { watch() -> stream string; }")]);
        let emitted = run(&schema, &SWIFT_BACKEND);
        assert!(emitted.files.is_empty());
        assert!(matches!(
            &emitted.errors[..],
            [EmitError::Unsupported { feature, .. }] if feature == "streaming endpoints"
        ));
    }

    #[test]
    fn test_self_containing_struct_is_unsupported() {
        let schema = schema(&[("foo", None, "type Node { next?: Node; } type List { items: [List]; }")]);
        let emitted = run(&schema, &SWIFT_BACKEND);
        assert_eq!(emitted.errors.len(), 1);
        let text = file(&emitted, "swift", "Foo.swift");
        assert!(text.contains("Foo_List"));
        assert!(!text.contains("Foo_Node"));
    }
}

// ============================================================================
// JavaScript
// ============================================================================

mod js {
    use super::*;

    #[test]
    fn test_class_and_helpers() {
        let schema = schema(&[(
            "foo",
            None,
            "type Thing { firstName: string; class?: u32; type Inner {} }",
        )]);
        let emitted = run(&schema, &JS_BACKEND);
        assert!(emitted.errors.is_empty());
        let text = file(&emitted, "js", "foo.js");
        assert!(text.contains("function _integer(name, value, min, max) {"));
        assert!(text.contains("export class Thing {"));
        assert!(text.contains("constructor(first_name, _class) {"));
        assert!(text.contains("_integer(\"class\", v__class, 0, 4294967295)"));
        assert!(text.contains("Thing.Inner = class Inner {"));
    }

    #[test]
    fn test_presence_ignores_inherited_keys() {
        let schema = schema(&[("foo", None, "type T { constructor: string; proto?: {string: u32}; }")]);
        let emitted = run(&schema, &JS_BACKEND);
        assert!(emitted.errors.is_empty());
        let text = file(&emitted, "js", "foo.js");
        assert!(text.contains("return Object.prototype.hasOwnProperty.call(data, key) && "));
        assert!(text.contains("if (!_present(data, \"constructor\")) {"));
        assert!(text.contains("_put(out, key(k), decode(value[k]));"));
        assert!(!text.contains("out[key(k)] ="));
    }

    #[test]
    fn test_imports_other_packages() {
        let schema = schema(CROSS_PACKAGE);
        let emitted = run(&schema, &JS_BACKEND);
        let text = file(&emitted, "js", "foo.js");
        assert!(text.starts_with("import * as bar__1_0_0 from \"./bar/_1_0_0.js\";\n"));
        assert!(text.contains("bar__1_0_0.Other.decode(v_other)"));
        assert!(!file(&emitted, "js", "bar/_1_0_0.js").contains("import"));
    }

    #[test]
    fn test_discriminator_placement() {
        let schema = schema(&[("foo", None, r#"interface I { A as "a" { b: string; } }"#)]);
        let position = |placement| {
            let options = EmitOptions {
                discriminator_placement: placement,
                ..EmitOptions::default()
            };
            let emitted = emit(&schema, &[&JS_BACKEND], &options);
            let text = file(&emitted, "js", "foo.js").to_string();
            let tag = text.find("data[\"type\"] = \"a\";").unwrap();
            let field = text.find("data[\"b\"] = this.b;").unwrap();
            tag < field
        };
        assert!(position(DiscriminatorPlacement::First));
        assert!(!position(DiscriminatorPlacement::Last));
    }

    #[test]
    fn test_enum_members() {
        let schema = schema(&[("foo", None, r#"enum Color { Red as "red"; Blue; }"#)]);
        let emitted = run(&schema, &JS_BACKEND);
        let text = file(&emitted, "js", "foo.js");
        assert!(text.contains("Color.Red = new Color(\"Red\", \"red\");"));
        assert!(text.contains("Color.values = [Color.Red, Color.Blue];"));
    }

    #[test]
    fn test_inline_tuple() {
        let schema = schema(&[("foo", None, "type A { pair: (string, u32); }")]);
        let emitted = run(&schema, &JS_BACKEND);
        assert!(emitted.errors.is_empty());
        assert!(file(&emitted, "js", "foo.js").contains("_tuple(\"pair\", v_pair, ["));
    }
}

// ============================================================================
// Pipeline
// ============================================================================

mod pipeline {
    use super::*;

    #[test]
    fn test_unsupported_declaration_only_affects_its_backend() {
        let schema = schema(&[("foo", None, "type A {} service Api { ping(); }")]);
        let emitted = emit(
            &schema,
            &[&CSHARP_BACKEND, &JS_BACKEND],
            &EmitOptions::default(),
        );
        assert_eq!(emitted.errors.len(), 1);
        assert_eq!(emitted.errors[0].backend(), "js");
        assert!(file(&emitted, "csharp", "Foo/Api.cs").contains("Task Ping();"));
        assert!(file(&emitted, "js", "foo.js").contains("export class A {"));
    }

    #[test]
    fn test_output_is_deterministic() {
        let schema = schema(CROSS_PACKAGE);
        let backends: [&dyn Backend; 3] = [&CSHARP_BACKEND, &SWIFT_BACKEND, &JS_BACKEND];
        let first = emit(&schema, &backends, &EmitOptions::default());
        let second = emit(&schema, &backends, &EmitOptions::default());
        assert_eq!(first.files, second.files);
        let order: Vec<_> = first.files.iter().map(|f| (f.backend, f.path.clone())).collect();
        let mut sorted = order.clone();
        sorted.sort();
        assert_eq!(order, sorted);
    }

    #[test]
    fn test_package_restriction() {
        let schema = schema(CROSS_PACKAGE);
        let options = EmitOptions {
            packages: vec![PackageId(0)],
            ..EmitOptions::default()
        };
        let emitted = emit(&schema, &[&JS_BACKEND], &options);
        let paths: Vec<_> = emitted.files.iter().map(|f| f.path.clone()).collect();
        assert_eq!(paths, [Path::new("bar/_1_0_0.js")]);
    }
}
