use reproto::config::{CodegenConfig, ReprotoConfig};
use reproto::pipeline::{self, BuildSettings};
use reproto::LoadError;
use reproto_core::{DiscriminatorPlacement, VersionScheme};
use reproto_resolve::ResolveOptions;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Write `(relative path, source)` pairs below `<dir>/proto`.
fn project(files: &[(&str, &str)]) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let proto = dir.path().join("proto");
    for (path, source) in files {
        let path = proto.join(path);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, source).unwrap();
    }
    (dir, proto)
}

fn settings(dir: &Path, proto: PathBuf) -> BuildSettings {
    BuildSettings {
        paths: vec![proto],
        output: dir.join("out"),
        ..BuildSettings::default()
    }
}

const CROSS_PACKAGE: &[(&str, &str)] = &[
    ("bar-1.0.0.reproto", "type Other { name: string; }"),
    (
        "foo.reproto",
        r#"
        use bar "^1" as bar;
        type Thing { other: bar::Other; }
        "#,
    ),
];

// ============================================================================
// Compilation
// ============================================================================

mod compile {
    use super::*;

    #[test]
    fn test_check_resolves_packages() {
        let (_dir, proto) = project(CROSS_PACKAGE);
        let compilation = pipeline::check(&[proto], &ResolveOptions::default()).unwrap();
        assert!(!compilation.has_errors());

        let schema = compilation.schema.unwrap();
        let identities: Vec<String> = schema.packages.iter().map(|p| p.identity()).collect();
        assert_eq!(identities, ["bar@1.0.0", "foo"]);
    }

    #[test]
    fn test_parse_errors_stop_resolution() {
        let (_dir, proto) = project(&[("foo.reproto", "type { }\ntype B { a: Missing; }")]);
        let compilation = pipeline::check(&[proto], &ResolveOptions::default()).unwrap();
        assert!(compilation.has_errors());
        assert!(compilation.schema.is_none());
    }

    #[test]
    fn test_unresolved_reference() {
        let (_dir, proto) = project(&[("foo.reproto", "type A { b: Missing; }")]);
        let compilation = pipeline::check(&[proto], &ResolveOptions::default()).unwrap();
        assert!(compilation.schema.is_none());
        let messages: Vec<&str> = compilation
            .diagnostics
            .iter()
            .map(|d| d.message.as_str())
            .collect();
        assert_eq!(messages, ["cannot find `Missing` in this scope"]);
    }

    #[test]
    fn test_settings_from_config() {
        let config = ReprotoConfig {
            codegen: CodegenConfig {
                version_scheme: Some(VersionScheme::Major),
                discriminator: Some("kind".to_string()),
                discriminator_placement: Some(DiscriminatorPlacement::First),
            },
            ..Default::default()
        };
        let settings = BuildSettings::from_config(&config);
        assert_eq!(settings.paths, [PathBuf::from("proto")]);
        assert_eq!(settings.resolve.version_scheme, VersionScheme::Major);
        assert_eq!(settings.resolve.default_tag, "kind");
        assert_eq!(settings.discriminator_placement, DiscriminatorPlacement::First);
    }
}

// ============================================================================
// Build
// ============================================================================

mod build {
    use super::*;

    #[test]
    fn test_build_writes_every_target() {
        let (dir, proto) = project(CROSS_PACKAGE);
        let report = pipeline::build(&settings(dir.path(), proto)).unwrap();
        assert!(!report.diagnostics.has_errors());

        let out = dir.path().join("out");
        for path in [
            "csharp/Foo/Thing.cs",
            "csharp/Bar/_1_0_0/Other.cs",
            "swift/Foo.swift",
            "swift/Bar/_1_0_0.swift",
            "js/foo.js",
            "js/bar/_1_0_0.js",
        ] {
            assert!(out.join(path).is_file(), "missing {}", path);
        }
        assert_eq!(report.written.len(), 6);

        let js = std::fs::read_to_string(out.join("js/foo.js")).unwrap();
        assert!(js.contains("import * as bar__1_0_0 from \"./bar/_1_0_0.js\";"));
    }

    #[test]
    fn test_unsupported_declaration_keeps_other_targets() {
        let (dir, proto) = project(&[(
            "foo.reproto",
            "type Item { id: string; }\nservice Api { get(id: string) -> Item; }",
        )]);
        let mut settings = settings(dir.path(), proto);
        settings.targets = vec!["csharp".to_string(), "js".to_string()];

        let report = pipeline::build(&settings).unwrap();
        assert_eq!(report.diagnostics.error_count(), 1);

        let out = dir.path().join("out");
        assert!(out.join("csharp/Foo/Api.cs").is_file());
        assert!(out.join("csharp/Foo/Item.cs").is_file());
        let js = std::fs::read_to_string(out.join("js/foo.js")).unwrap();
        assert!(js.contains("export class Item {"));
        assert!(!js.contains("Api"));
    }

    #[test]
    fn test_package_restriction() {
        let (dir, proto) = project(CROSS_PACKAGE);
        let mut settings = settings(dir.path(), proto);
        settings.targets = vec!["js".to_string()];
        settings.packages = vec!["bar".to_string()];

        let report = pipeline::build(&settings).unwrap();
        assert_eq!(report.written, [dir.path().join("out/js/bar/_1_0_0.js")]);
    }

    #[test]
    fn test_unknown_target() {
        let (dir, proto) = project(CROSS_PACKAGE);
        let mut settings = settings(dir.path(), proto);
        settings.targets = vec!["cobol".to_string()];
        assert!(matches!(
            pipeline::build(&settings),
            Err(LoadError::UnknownTarget { name, .. }) if name == "cobol"
        ));
    }

    #[test]
    fn test_output_is_deterministic() {
        let (dir, proto) = project(CROSS_PACKAGE);
        let settings = settings(dir.path(), proto);
        pipeline::build(&settings).unwrap();
        let first = std::fs::read_to_string(dir.path().join("out/swift/Foo.swift")).unwrap();
        pipeline::build(&settings).unwrap();
        let second = std::fs::read_to_string(dir.path().join("out/swift/Foo.swift")).unwrap();
        assert_eq!(first, second);
    }
}

// ============================================================================
// Lookup
// ============================================================================

mod lookup {
    use super::*;

    const VERSIONS: &[(&str, &str)] = &[
        ("bar-1.0.0.reproto", "type Other { name: string; }"),
        ("bar-2.0.0.reproto", "type Other { name: string; type Inner {} }"),
    ];

    fn schema() -> reproto_core::Schema {
        let (_dir, proto) = project(VERSIONS);
        pipeline::check(&[proto], &ResolveOptions::default())
            .unwrap()
            .schema
            .unwrap()
    }

    #[test]
    fn test_select_packages() {
        let schema = schema();
        assert_eq!(pipeline::select_packages(&schema, "bar").unwrap().len(), 2);
        assert_eq!(
            pipeline::select_packages(&schema, "bar@2.0.0").unwrap().len(),
            1
        );
        assert!(matches!(
            pipeline::select_packages(&schema, "bar@3.0.0"),
            Err(LoadError::UnknownPackage(_))
        ));
    }

    #[test]
    fn test_lookup_decl() {
        let schema = schema();
        let inner = pipeline::lookup_decl(&schema, "bar@2.0.0::Other::Inner").unwrap();
        assert_eq!(schema.decl_path(inner), ["Other", "Inner"]);

        assert!(matches!(
            pipeline::lookup_decl(&schema, "bar::Other"),
            Err(LoadError::AmbiguousPackage { candidates, .. }) if candidates.len() == 2
        ));
        assert!(matches!(
            pipeline::lookup_decl(&schema, "bar@1.0.0::Other::Inner"),
            Err(LoadError::UnknownDecl { .. })
        ));
        assert!(matches!(
            pipeline::lookup_decl(&schema, "bar@1.0.0"),
            Err(LoadError::MalformedName(_))
        ));
    }
}
