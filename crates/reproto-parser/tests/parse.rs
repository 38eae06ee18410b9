use reproto_core::{Number, Primitive};
use reproto_parser::ast::*;
use reproto_parser::{MAX_NESTING, ParseError, parse};

fn parse_ok(source: &str) -> File {
    let (file, errors) = parse(0, source);
    assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
    file
}

fn fields(members: &[Member]) -> Vec<&Field> {
    members
        .iter()
        .filter_map(|m| match m {
            Member::Field(field) => Some(field),
            Member::Decl(_) => None,
        })
        .collect()
}

// ============================================================================
// Declarations
// ============================================================================

mod declarations {
    use super::*;

    #[test]
    fn test_type_with_fields() {
        let file = parse_ok(
            r#"
            /// An entry.
            type Entry {
                /// The name.
                name: string;
                tags?: [string] as "entry_tags";
                extra: {string: u32};
            }
            "#,
        );
        let decl = &file.decls[0];
        assert_eq!(decl.name.value, "Entry");
        assert_eq!(decl.doc, ["An entry."]);

        let DeclKind::Type(members) = &decl.kind else {
            panic!("expected type");
        };
        let fields = fields(members);
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0].doc, ["The name."]);
        assert_eq!(fields[0].ty.value, Type::Primitive(Primitive::String));
        assert!(fields[1].optional);
        assert_eq!(fields[1].alias.as_ref().unwrap().value, "entry_tags");
        assert_eq!(
            fields[1].ty.value,
            Type::Array(Box::new(Type::Primitive(Primitive::String)))
        );
        assert_eq!(
            fields[2].ty.value,
            Type::Map(
                Box::new(Type::Primitive(Primitive::String)),
                Box::new(Type::Primitive(Primitive::U32))
            )
        );
    }

    #[test]
    fn test_nested_declarations() {
        let file = parse_ok(
            r#"
            type Bar {
                inner: Bar::Inner;
                type Inner { bar: Bar; }
            }
            "#,
        );
        let DeclKind::Type(members) = &file.decls[0].kind else {
            panic!("expected type");
        };
        let field = fields(members)[0];
        let Type::Name(name) = &field.ty.value else {
            panic!("expected name");
        };
        assert_eq!(name.path, ["Bar", "Inner"]);
        assert_eq!(name.prefix, None);
        assert!(matches!(&members[1], Member::Decl(d) if d.name.value == "Inner"));
    }

    #[test]
    fn test_tuple_shorthand() {
        let file = parse_ok("tuple Tuple1 (a: string, b: u64)");
        let DeclKind::Tuple(members) = &file.decls[0].kind else {
            panic!("expected tuple");
        };
        let names: Vec<_> = fields(members).iter().map(|f| f.name.value.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn test_tuple_block_form() {
        let file = parse_ok("tuple Pair { first: string; second: (u32, bool_value::Flag); }");
        let DeclKind::Tuple(members) = &file.decls[0].kind else {
            panic!("expected tuple");
        };
        let Type::Tuple(items) = &fields(members)[1].ty.value else {
            panic!("expected inline tuple");
        };
        assert_eq!(items.len(), 2);
        assert!(matches!(&items[1], Type::Name(n) if n.prefix.as_deref() == Some("bool_value")));
    }

    #[test]
    fn test_interface_with_sub_types() {
        let file = parse_ok(
            r#"
            #[type_info(strategy = "tagged", tag = "@type")]
            interface Tagged {
                shared: string;

                /// First.
                A as "foo" {
                    a?: string;
                }

                B;
            }
            "#,
        );
        let decl = &file.decls[0];
        assert_eq!(decl.attributes[0].name.value, "type_info");
        assert_eq!(decl.attributes[0].args.len(), 2);
        assert_eq!(
            decl.attributes[0].args[1].value.as_ref().unwrap().value,
            Value::String("@type".to_string())
        );

        let DeclKind::Interface(body) = &decl.kind else {
            panic!("expected interface");
        };
        assert_eq!(fields(&body.members).len(), 1);
        assert_eq!(body.sub_types.len(), 2);
        assert_eq!(body.sub_types[0].doc, ["First."]);
        assert_eq!(
            body.sub_types[0].alias.as_ref().unwrap().value,
            Value::String("foo".to_string())
        );
        assert!(body.sub_types[1].members.is_empty());
    }

    #[test]
    fn test_enum() {
        let file = parse_ok(
            r#"
            enum EnumU32 as u32 {
                Min as 0;
                Max as 2147483647;
            }
            enum Implicit { A; B; }
            "#,
        );
        let DeclKind::Enum(body) = &file.decls[0].kind else {
            panic!("expected enum");
        };
        assert_eq!(
            body.ty.as_ref().unwrap().value,
            Type::Primitive(Primitive::U32)
        );
        assert_eq!(
            body.members[1].value.as_ref().unwrap().value,
            Value::Number(Number::Integer(2147483647))
        );

        let DeclKind::Enum(body) = &file.decls[1].kind else {
            panic!("expected enum");
        };
        assert!(body.ty.is_none());
        assert!(body.members.iter().all(|m| m.value.is_none()));
    }

    #[test]
    fn test_service() {
        let file = parse_ok(
            r#"
            service MyService {
                unknown();
                unary(request: Entry) -> Entry;
                server_streaming(request: Entry) -> stream Entry as "ServerStreaming";
            }
            "#,
        );
        let DeclKind::Service(body) = &file.decls[0].kind else {
            panic!("expected service");
        };
        assert_eq!(body.endpoints.len(), 3);
        assert!(body.endpoints[0].arguments.is_empty());
        assert!(body.endpoints[0].response.is_none());
        assert!(!body.endpoints[1].response.as_ref().unwrap().streaming);
        assert!(body.endpoints[2].response.as_ref().unwrap().streaming);
        assert_eq!(
            body.endpoints[2].alias.as_ref().unwrap().value,
            "ServerStreaming"
        );
    }

    #[test]
    fn test_escaped_keyword_field() {
        let file = parse_ok("type Foo { _type: string; _other: string; }");
        let DeclKind::Type(members) = &file.decls[0].kind else {
            panic!("expected type");
        };
        let names: Vec<_> = fields(members).iter().map(|f| f.name.value.as_str()).collect();
        assert_eq!(names, ["type", "_other"]);
    }
}

// ============================================================================
// Imports and package docs
// ============================================================================

mod imports {
    use super::*;

    #[test]
    fn test_use_declarations() {
        let file = parse_ok(
            r#"
            //! Package docs.
            use foo.bar "^1.0.0" as bar2;
            use baz;
            "#,
        );
        assert_eq!(file.doc, ["Package docs."]);
        assert_eq!(file.uses.len(), 2);
        assert_eq!(file.uses[0].package.value.to_string(), "foo.bar");
        assert_eq!(file.uses[0].range.as_ref().unwrap().value, "^1.0.0");
        assert_eq!(file.uses[0].local_name(), "bar2");
        assert!(file.uses[1].range.is_none());
        assert_eq!(file.uses[1].local_name(), "baz");
    }
}

// ============================================================================
// Errors
// ============================================================================

mod errors {
    use super::*;

    #[test]
    fn test_unterminated_string() {
        let (_, errors) = parse(0, "type Foo { a: string as \"oops; }");
        assert!(matches!(errors[0], ParseError::UnterminatedString { .. }));
    }

    #[test]
    fn test_unknown_keyword() {
        let (_, errors) = parse(0, "struct Foo {}");
        assert!(matches!(
            &errors[0],
            ParseError::UnknownKeyword { word, .. } if word == "struct"
        ));
    }

    #[test]
    fn test_malformed_number() {
        let (_, errors) = parse(0, "enum E as u32 { A as 1.; }");
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ParseError::InvalidNumber { .. }));
    }

    #[test]
    fn test_invalid_escape_span() {
        let source = r#"type Foo { a: string as "x\qy"; }"#;
        let (_, errors) = parse(0, source);
        let ParseError::InvalidEscape { sequence, span } = &errors[0] else {
            panic!("expected invalid escape, got {:?}", errors);
        };
        assert_eq!(sequence, "\\q");
        assert_eq!(&source[span.range()], "\\q");
    }

    #[test]
    fn test_recovers_at_next_declaration() {
        let (file, errors) = parse(
            0,
            r#"
            type Broken { a string; }
            type Fine { a: string; }
            type AlsoBroken { b: ; }
            enum Ok { A; }
            "#,
        );
        assert_eq!(errors.len(), 2);
        let names: Vec<_> = file.decls.iter().map(|d| d.name.value.as_str()).collect();
        assert_eq!(names, ["Fine", "Ok"]);
    }

    #[test]
    fn test_unexpected_eof() {
        let (_, errors) = parse(0, "type Foo {");
        assert!(matches!(errors[0], ParseError::UnexpectedEof { .. }));
        insta::assert_snapshot!(
            errors[0].to_string(),
            @"unexpected end of file, expected a field or declaration"
        );
    }

    #[test]
    fn test_deep_array_type_is_an_error() {
        let source = format!(
            "type Foo {{ a: {}string{}; }} type Fine {{ b: string; }}",
            "[".repeat(10_000),
            "]".repeat(10_000)
        );
        let (file, errors) = parse(0, &source);
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            errors[0],
            ParseError::NestedTooDeep { limit: MAX_NESTING, .. }
        ));
        insta::assert_snapshot!(errors[0].to_string(), @"nesting is deeper than 64 levels");
        let names: Vec<_> = file.decls.iter().map(|d| d.name.value.as_str()).collect();
        assert_eq!(names, ["Fine"]);
    }

    #[test]
    fn test_deep_declarations_are_an_error() {
        let source = format!("{}{} type Fine {{}}", "type A { ".repeat(500), "}".repeat(500));
        let (file, errors) = parse(0, &source);
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ParseError::NestedTooDeep { .. }));
        assert_eq!(file.decls.len(), 1);
        assert_eq!(file.decls[0].name.value, "Fine");
    }

    #[test]
    fn test_moderate_nesting_parses() {
        let source = format!("type Foo {{ a: {}string{}; }}", "[".repeat(32), "]".repeat(32));
        let file = parse_ok(&source);
        let DeclKind::Type(members) = &file.decls[0].kind else {
            panic!("expected a type");
        };
        let [Member::Field(field)] = &members[..] else {
            panic!("expected one field");
        };
        let mut depth = 0;
        let mut ty = &field.ty.value;
        while let Type::Array(inner) = ty {
            depth += 1;
            ty = inner.as_ref();
        }
        assert_eq!(depth, 32);
    }
}
