use reproto_core::schema::*;
use reproto_core::{PackageName, Version, VersionScheme};
use reproto_parser::parse;
use reproto_resolve::{ResolveError, ResolveOptions, ResolveWarning, Resolved, SourceFile, resolve};

/// `(package, version, source)` triples, one file each.
fn sources(files: &[(&str, Option<&str>, &str)]) -> Vec<SourceFile> {
    files
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
        .collect()
}

fn resolve_ok(files: &[(&str, Option<&str>, &str)]) -> Resolved {
    resolve(&sources(files), &ResolveOptions::default()).expect("resolution failed")
}

fn resolve_err(files: &[(&str, Option<&str>, &str)]) -> Vec<ResolveError> {
    match resolve(&sources(files), &ResolveOptions::default()) {
        Ok(_) => panic!("expected resolution to fail"),
        Err(errors) => errors,
    }
}

fn field_type<'a>(schema: &'a Schema, decl: DeclId, field: &str) -> &'a TypeRef {
    &schema
        .decl(decl)
        .fields()
        .iter()
        .find(|f| f.name == field)
        .unwrap()
        .ty
}

// ============================================================================
// References
// ============================================================================

mod references {
    use super::*;

    #[test]
    fn test_version_range_selects_matching_package() {
        let resolved = resolve_ok(&[
            ("bar", Some("1.0.0"), "type Other { name: string; }"),
            ("bar", Some("2.0.0"), "type Other { name2: string; }"),
            (
                "foo",
                None,
                r#"
                use bar "^1.0.0" as bar;
                type Thing { other: bar::Other; }
                "#,
            ),
        ]);
        let schema = &resolved.schema;
        let thing = schema.lookup(PackageId(2), &["Thing"]).unwrap();
        let TypeRef::Decl(other) = field_type(schema, thing, "other") else {
            panic!("expected a declaration reference");
        };
        let package = schema.package(other.package);
        assert_eq!(package.version, Some(Version::new(1, 0, 0)));
        assert_eq!(package.namespace.to_string(), "bar._1_0_0");
        assert_eq!(schema.decl(*other).fields()[0].name, "name");
    }

    #[test]
    fn test_highest_matching_version_wins() {
        let resolved = resolve_ok(&[
            ("bar", Some("1.0.0"), "type Other {}"),
            ("bar", Some("1.4.0"), "type Other {}"),
            ("foo", None, "use bar \"^1\"; type Thing { other: bar::Other; }"),
        ]);
        let schema = &resolved.schema;
        let thing = schema.lookup(PackageId(2), &["Thing"]).unwrap();
        assert_eq!(
            field_type(schema, thing, "other"),
            &TypeRef::Decl(DeclId {
                package: PackageId(1),
                index: 0
            })
        );
    }

    #[test]
    fn test_nested_and_outer_scope_lookup() {
        let resolved = resolve_ok(&[(
            "foo",
            None,
            r#"
            type A {
                b: B;
                type B { back: A; inner: [C]; }
                type C {}
            }
            "#,
        )]);
        let schema = &resolved.schema;
        let a = schema.lookup(PackageId(0), &["A"]).unwrap();
        let b = schema.lookup(PackageId(0), &["A", "B"]).unwrap();
        let c = schema.lookup(PackageId(0), &["A", "C"]).unwrap();
        assert_eq!(field_type(schema, a, "b"), &TypeRef::Decl(b));
        assert_eq!(field_type(schema, b, "back"), &TypeRef::Decl(a));
        assert_eq!(
            field_type(schema, b, "inner"),
            &TypeRef::Array(Box::new(TypeRef::Decl(c)))
        );
        assert_eq!(schema.decl(b).parent, Some(a.index));
    }

    #[test]
    fn test_qualified_nested_path() {
        let resolved = resolve_ok(&[(
            "foo",
            None,
            "type A { type Inner {} } type B { inner: A::Inner; }",
        )]);
        let schema = &resolved.schema;
        let inner = schema.lookup(PackageId(0), &["A", "Inner"]).unwrap();
        let b = schema.lookup(PackageId(0), &["B"]).unwrap();
        assert_eq!(field_type(schema, b, "inner"), &TypeRef::Decl(inner));
    }

    #[test]
    fn test_unresolved_reference() {
        let errors = resolve_err(&[("foo", None, "type A { b: Missing; }")]);
        assert!(matches!(
            &errors[..],
            [ResolveError::UnresolvedReference { name, .. }] if name == "Missing"
        ));
    }

    #[test]
    fn test_unresolved_package() {
        let errors = resolve_err(&[
            ("bar", Some("2.0.0"), "type Other {}"),
            ("foo", None, "use bar \"^1.0.0\"; type A { b: bar::Other; }"),
        ]);
        assert!(matches!(errors[0], ResolveError::UnresolvedPackage { .. }));
        // The reference through the failed import is also unresolved.
        assert!(matches!(errors[1], ResolveError::UnresolvedReference { .. }));
    }

    #[test]
    fn test_ambiguous_version() {
        let errors = resolve_err(&[
            ("bar", Some("1.0.0"), "type Other {}"),
            ("bar", Some("2.0.0"), "type Other {}"),
            ("foo", None, "use bar; type A {}"),
        ]);
        assert_eq!(
            errors[0],
            ResolveError::AmbiguousVersion {
                package: "bar".to_string(),
                candidates: vec!["bar@1.0.0".to_string(), "bar@2.0.0".to_string()],
                span: errors[0].span().unwrap(),
            }
        );
    }

    #[test]
    fn test_duplicate_package() {
        let errors = resolve_err(&[
            ("bar", Some("1.0.0"), "type A {}"),
            ("bar", Some("1.0.0"), "type B {}"),
        ]);
        assert!(matches!(
            &errors[..],
            [ResolveError::DuplicatePackage { package, .. }] if package == "bar@1.0.0"
        ));
    }

    #[test]
    fn test_invalid_map_key() {
        let errors = resolve_err(&[("foo", None, "type A { m: {double: string}; }")]);
        assert!(matches!(errors[0], ResolveError::InvalidMapKey { .. }));
    }
}

// ============================================================================
// Declarations
// ============================================================================

mod declarations {
    use super::*;

    #[test]
    fn test_duplicate_declaration() {
        let errors = resolve_err(&[("foo", None, "type A {} tuple A {}")]);
        assert!(matches!(
            &errors[..],
            [ResolveError::DuplicateName { what: "declaration", name, .. }] if name == "A"
        ));
    }

    #[test]
    fn test_duplicate_json_name() {
        let errors = resolve_err(&[("foo", None, r#"type A { a: string; b: string as "a"; }"#)]);
        assert!(matches!(errors[0], ResolveError::DuplicateJsonName { .. }));
    }

    #[test]
    fn test_field_rename() {
        let resolved = resolve_ok(&[("foo", None, r#"type A { a: string as "b"; }"#)]);
        let field = &resolved.schema.packages[0].decls[0].fields()[0];
        assert_eq!(field.name, "a");
        assert_eq!(field.json_name, "b");
    }

    #[test]
    fn test_optional_tuple_field() {
        let errors = resolve_err(&[("foo", None, "tuple T { a?: string; }")]);
        assert!(matches!(errors[0], ResolveError::OptionalTupleField { .. }));
    }

    #[test]
    fn test_enum_values() {
        let resolved = resolve_ok(&[(
            "foo",
            None,
            r#"
            enum Implicit { A; B as "bee"; }
            enum Numbers as u32 { Min as 0; Max as 4294967295; }
            "#,
        )]);
        let package = &resolved.schema.packages[0];
        let DeclKind::Enum(implicit) = &package.decls[0].kind else {
            panic!("expected enum");
        };
        assert_eq!(implicit.ty, EnumType::String);
        assert_eq!(implicit.members[0].value, EnumValue::String("A".to_string()));
        assert_eq!(implicit.members[1].value, EnumValue::String("bee".to_string()));

        let DeclKind::Enum(numbers) = &package.decls[1].kind else {
            panic!("expected enum");
        };
        assert_eq!(numbers.members[1].value, EnumValue::Number(4294967295));
    }

    #[test]
    fn test_duplicate_enum_value() {
        let errors = resolve_err(&[("foo", None, "enum E as u32 { A as 1; B as 1; }")]);
        assert!(matches!(
            &errors[..],
            [ResolveError::DuplicateEnumValue { value, .. }] if value == "1"
        ));
        insta::assert_snapshot!(errors[0].to_string(), @"enum value 1 is used by more than one member");
    }

    #[test]
    fn test_enum_value_out_of_range() {
        let errors = resolve_err(&[("foo", None, "enum E as u32 { A as -1; }")]);
        assert!(matches!(errors[0], ResolveError::InvalidEnumValue { .. }));
    }

    #[test]
    fn test_numeric_enum_requires_values() {
        let errors = resolve_err(&[("foo", None, "enum E as i32 { A; }")]);
        assert!(matches!(errors[0], ResolveError::InvalidEnumValue { .. }));
    }

    #[test]
    fn test_invalid_enum_type() {
        let errors = resolve_err(&[("foo", None, "enum E as double { A as 1; }")]);
        assert!(matches!(errors[0], ResolveError::InvalidEnumType { .. }));
    }

    #[test]
    fn test_attribute_on_type() {
        let errors = resolve_err(&[("foo", None, "#[type_info(strategy = \"tagged\")] type A {}")]);
        assert!(matches!(errors[0], ResolveError::UnknownAttribute { .. }));
    }

    #[test]
    fn test_service_endpoints() {
        let resolved = resolve_ok(&[(
            "foo",
            None,
            r#"
            service Api {
                get(id: string) -> Item;
                watch(ids: stream string) -> stream Item as "watch_items";
                type Item { id: string; }
            }
            "#,
        )]);
        let package = &resolved.schema.packages[0];
        let DeclKind::Service(body) = &package.decls[0].kind else {
            panic!("expected service");
        };
        assert_eq!(body.endpoints[0].id, "get");
        assert_eq!(body.endpoints[1].id, "watch_items");
        assert!(body.endpoints[1].arguments[0].channel.streaming);
        let item = resolved.schema.lookup(PackageId(0), &["Api", "Item"]).unwrap();
        assert_eq!(
            body.endpoints[0].response.as_ref().unwrap().ty,
            TypeRef::Decl(item)
        );
    }

    #[test]
    fn test_required_cycle_is_a_warning() {
        let resolved = resolve_ok(&[(
            "foo",
            None,
            "type A { b: B; } type B { a: A; } type C { c?: C; } type D { d: [D]; }",
        )]);
        assert_eq!(
            resolved.warnings,
            [ResolveWarning::RequiredCycle {
                path: vec!["A".to_string(), "B".to_string(), "A".to_string()],
                span: resolved.schema.packages[0].decls[0].span,
            }]
        );
        insta::assert_snapshot!(
            resolved.warnings[0].to_string(),
            @"required fields form a cycle (A -> B -> A), no value of `A` can be constructed"
        );
    }

    #[test]
    fn test_long_required_chain_is_one_cycle() {
        let count = 20_000;
        let source: String = (0..count)
            .map(|i| format!("type T{} {{ next: T{}; }}\n", i, (i + 1) % count))
            .collect();
        let resolved = resolve_ok(&[("foo", None, source.as_str())]);
        let [ResolveWarning::RequiredCycle { path, .. }] = &resolved.warnings[..] else {
            panic!("expected one cycle, got {:?}", resolved.warnings.len());
        };
        assert_eq!(path.len(), count + 1);
        assert_eq!(path.first(), path.last());
    }
}

// ============================================================================
// Interfaces
// ============================================================================

mod interfaces {
    use super::*;

    fn interface(resolved: &Resolved) -> &InterfaceBody {
        match &resolved.schema.packages[0].decls[0].kind {
            DeclKind::Interface(body) => body,
            other => panic!("expected interface, found {}", other.name()),
        }
    }

    #[test]
    fn test_default_tag_and_literals() {
        let resolved = resolve_ok(&[(
            "foo",
            None,
            r#"interface I { A as "a"; B { b: string; } }"#,
        )]);
        let body = interface(&resolved);
        assert_eq!(
            body.strategy,
            SubTypeStrategy::Tagged {
                tag: "type".to_string()
            }
        );
        assert_eq!(body.sub_types[0].literal, "a");
        assert_eq!(body.sub_types[1].literal, "B");
    }

    #[test]
    fn test_type_info_tag() {
        let resolved = resolve_ok(&[(
            "foo",
            None,
            r#"#[type_info(strategy = "tagged", tag = "@type")] interface I { A; }"#,
        )]);
        assert_eq!(
            interface(&resolved).strategy,
            SubTypeStrategy::Tagged {
                tag: "@type".to_string()
            }
        );
    }

    #[test]
    fn test_configured_default_tag() {
        let options = ResolveOptions {
            version_scheme: VersionScheme::Underscored,
            default_tag: "kind".to_string(),
        };
        let resolved = resolve(&sources(&[("foo", None, "interface I { A; }")]), &options).unwrap();
        assert_eq!(
            interface(&resolved).strategy,
            SubTypeStrategy::Tagged {
                tag: "kind".to_string()
            }
        );
    }

    #[test]
    fn test_sub_type_shadows_nested_declaration() {
        let errors = resolve_err(&[("foo", None, "interface I { A; type A {} }")]);
        assert!(matches!(
            &errors[..],
            [ResolveError::DuplicateName { what: "sub-type", name, .. }] if name == "A"
        ));
    }

    #[test]
    fn test_duplicate_discriminator() {
        let errors = resolve_err(&[("foo", None, r#"interface I { A as "x"; B as "x"; }"#)]);
        assert!(matches!(errors[0], ResolveError::DuplicateDiscriminator { .. }));
    }

    #[test]
    fn test_non_string_discriminator() {
        let errors = resolve_err(&[("foo", None, "interface I { A as 1; }")]);
        assert!(matches!(
            errors[0],
            ResolveError::InvalidDiscriminator { found: "number", .. }
        ));
    }

    #[test]
    fn test_tag_conflicts_with_field() {
        let errors = resolve_err(&[("foo", None, r#"interface I { A { kind: string as "type"; } }"#)]);
        assert!(matches!(errors[0], ResolveError::TagConflict { .. }));
    }

    #[test]
    fn test_unknown_strategy() {
        let errors = resolve_err(&[(
            "foo",
            None,
            r#"#[type_info(strategy = "sometimes")] interface I { A; }"#,
        )]);
        assert!(matches!(errors[0], ResolveError::InvalidAttribute { .. }));
    }

    #[test]
    fn test_untagged_valid() {
        let resolved = resolve_ok(&[(
            "foo",
            None,
            r#"
            #[type_info(strategy = "untagged")]
            interface I {
                shared: string;
                Both { a: string; b: string; }
                A { a: string; }
                B { b: string; }
            }
            "#,
        )]);
        assert_eq!(interface(&resolved).strategy, SubTypeStrategy::Untagged);
    }

    #[test]
    fn test_untagged_ambiguous() {
        let errors = resolve_err(&[(
            "foo",
            None,
            r#"
            #[type_info(strategy = "untagged")]
            interface I {
                A { a: string; }
                B { a: u32; }
            }
            "#,
        )]);
        assert!(matches!(
            &errors[..],
            [ResolveError::UntaggedAmbiguous { sub_type, other, .. }]
                if sub_type == "B" && other == "A"
        ));
    }

    #[test]
    fn test_untagged_ordering() {
        let errors = resolve_err(&[(
            "foo",
            None,
            r#"
            #[type_info(strategy = "untagged")]
            interface I {
                A { a: string; }
                B { a: string; b: string; }
            }
            "#,
        )]);
        assert!(matches!(
            &errors[..],
            [ResolveError::UntaggedOrdering { sub_type, later, .. }]
                if sub_type == "A" && later == "B"
        ));
    }

    #[test]
    fn test_untagged_optional_conflict() {
        let errors = resolve_err(&[(
            "foo",
            None,
            r#"
            #[type_info(strategy = "untagged")]
            interface I {
                A { a: string; b?: string; }
                B { b: string; }
            }
            "#,
        )]);
        assert!(matches!(
            &errors[..],
            [ResolveError::UntaggedOptional { sub_type, field, other, .. }]
                if sub_type == "A" && field == "b" && other == "B"
        ));
    }
}
