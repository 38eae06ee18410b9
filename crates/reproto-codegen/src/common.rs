//! Helpers shared by the backends.

use reproto_core::{DeclId, Field, Namespace, Schema, TypeRef};
use reproto_naming::{Casing, Language, escape, escape_all};

/// Namespace segments with `casing` applied to the package parts.
///
/// Version segments are never re-cased.
pub(crate) fn namespace_segments(namespace: &Namespace, casing: Option<Casing>) -> Vec<String> {
    let mut segments: Vec<String> = namespace
        .parts
        .iter()
        .map(|part| match casing {
            Some(casing) => casing.apply(part),
            None => part.clone(),
        })
        .collect();
    segments.extend(namespace.version.clone());
    segments
}

/// Identifier for a declaration name.
pub(crate) fn type_ident(name: &str, language: Language) -> String {
    escape(&Casing::UpperCamel.apply(name), language)
}

/// Identifiers for a group of sibling fields, guaranteed distinct.
pub(crate) fn field_idents<'a>(
    fields: impl IntoIterator<Item = &'a Field>,
    casing: Casing,
    language: Language,
) -> Vec<String> {
    escape_all(fields.into_iter().map(|f| f.name.as_str()), casing, language)
}

/// Whether `ty` mentions an anonymous tuple, without following declarations.
pub(crate) fn has_inline_tuple(ty: &TypeRef) -> bool {
    match ty {
        TypeRef::Tuple(_) => true,
        TypeRef::Array(inner) => has_inline_tuple(inner),
        TypeRef::Map(key, value) => has_inline_tuple(key) || has_inline_tuple(value),
        TypeRef::Primitive(_) | TypeRef::Decl(_) => false,
    }
}

/// Declarations referenced by `ty`, without following them.
pub(crate) fn referenced_decls(ty: &TypeRef, out: &mut Vec<DeclId>) {
    match ty {
        TypeRef::Decl(id) => out.push(*id),
        TypeRef::Array(inner) => referenced_decls(inner, out),
        TypeRef::Map(key, value) => {
            referenced_decls(key, out);
            referenced_decls(value, out);
        }
        TypeRef::Tuple(items) => items.iter().for_each(|item| referenced_decls(item, out)),
        TypeRef::Primitive(_) => {}
    }
}

/// `id` and every declaration nested in it, parents first.
pub(crate) fn with_descendants(schema: &Schema, id: DeclId) -> Vec<DeclId> {
    let package = schema.package(id.package);
    let mut out = vec![id];
    let mut index = 0;
    while index < out.len() {
        let decl = schema.decl(out[index]);
        out.extend(package.children(decl).map(|(child, _)| child));
        index += 1;
    }
    out
}

/// Human readable name of `id` for error messages, e.g. `foo::Outer::Inner`.
pub(crate) fn display_path(schema: &Schema, id: DeclId) -> String {
    let package = schema.package(id.package);
    format!("{}::{}", package.identity(), schema.decl_path(id).join("::"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reproto_core::Primitive;

    #[test]
    fn test_namespace_segments_keep_version() {
        let namespace = Namespace {
            parts: vec!["foo".to_string(), "bar_baz".to_string()],
            version: Some("_1_0_0".to_string()),
        };
        assert_eq!(
            namespace_segments(&namespace, Some(Casing::UpperCamel)),
            ["Foo", "BarBaz", "_1_0_0"]
        );
        assert_eq!(namespace_segments(&namespace, None), ["foo", "bar_baz", "_1_0_0"]);
    }

    #[test]
    fn test_inline_tuple_detection() {
        let tuple = TypeRef::Tuple(vec![TypeRef::Primitive(Primitive::String)]);
        assert!(has_inline_tuple(&TypeRef::Array(Box::new(tuple))));
        assert!(!has_inline_tuple(&TypeRef::Primitive(Primitive::Any)));
    }
}
