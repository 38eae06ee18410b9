//! The resolver proper.

use crate::error::ResolveError;
use crate::packages::{Selection, select};
use crate::validate;
use crate::{ResolveOptions, Resolved, SourceFile};
use reproto_core::namespace::{self, Namespace};
use reproto_core::package::display_identity;
use reproto_core::schema::*;
use reproto_core::{PackageName, PackageRef, Span, Spanned, Version, VersionReq};
use reproto_parser::ast;
use std::collections::HashMap;
use tracing::debug;

/// Resolve a set of parsed files into a [`Schema`].
///
/// Each file defines exactly one package; files are assigned [`PackageId`]s
/// in the order given.
pub fn resolve(files: &[SourceFile], options: &ResolveOptions) -> Result<Resolved, Vec<ResolveError>> {
    let mut resolver = Resolver::new(files, options);
    let namespaces = if resolver.check_duplicate_packages() {
        resolver.assign_namespaces()
    } else {
        vec![Namespace::default(); files.len()]
    };

    for unit in 0..resolver.units.len() {
        let decls: Vec<&ast::Decl> = files[unit].ast.decls.iter().collect();
        let roots = resolver.register(unit, decls, None);
        resolver.units[unit].roots = roots;
    }
    for unit in 0..resolver.units.len() {
        resolver.resolve_imports(unit);
    }

    let mut packages = Vec::with_capacity(files.len());
    for (unit, namespace) in namespaces.into_iter().enumerate() {
        packages.push(resolver.build_package(unit, namespace));
    }

    if !resolver.errors.is_empty() {
        return Err(resolver.errors);
    }

    let schema = Schema { packages };
    let warnings = validate::required_cycles(&schema);
    debug!(
        packages = schema.packages.len(),
        warnings = warnings.len(),
        "resolved schema"
    );
    Ok(Resolved { schema, warnings })
}

/// A declaration registered but not yet converted.
struct Pending<'a> {
    name: String,
    parent: Option<usize>,
    children: Vec<usize>,
    ast: &'a ast::Decl,
}

/// Per-package resolution state.
struct Unit<'a> {
    source: &'a SourceFile,
    decls: Vec<Pending<'a>>,
    roots: Vec<usize>,
    /// Import alias to package index.
    imports: HashMap<String, (usize, Span)>,
}

struct Resolver<'a> {
    options: &'a ResolveOptions,
    units: Vec<Unit<'a>>,
    identities: Vec<(PackageName, Option<Version>)>,
    errors: Vec<ResolveError>,
}

fn nested_members(members: &[ast::Member]) -> impl Iterator<Item = &ast::Decl> {
    members.iter().filter_map(|member| match member {
        ast::Member::Decl(decl) => Some(decl),
        ast::Member::Field(_) => None,
    })
}

fn nested_decls(decl: &ast::Decl) -> Vec<&ast::Decl> {
    match &decl.kind {
        ast::DeclKind::Type(members) | ast::DeclKind::Tuple(members) => {
            nested_members(members).collect()
        }
        ast::DeclKind::Interface(body) => nested_members(&body.members)
            .chain(body.sub_types.iter().flat_map(|s| nested_members(&s.members)))
            .collect(),
        ast::DeclKind::Enum(_) => Vec::new(),
        ast::DeclKind::Service(body) => body.decls.iter().collect(),
    }
}

fn field_members(members: &[ast::Member]) -> impl Iterator<Item = &ast::Field> {
    members.iter().filter_map(|member| match member {
        ast::Member::Field(field) => Some(field),
        ast::Member::Decl(_) => None,
    })
}

fn describe(ty: &ast::Type) -> String {
    match ty {
        ast::Type::Primitive(primitive) => format!("`{}`", primitive),
        ast::Type::Name(name) => format!("`{}`", name),
        ast::Type::Array(_) => "an array".to_string(),
        ast::Type::Map(_, _) => "a map".to_string(),
        ast::Type::Tuple(_) => "a tuple".to_string(),
    }
}

impl<'a> Resolver<'a> {
    fn new(files: &'a [SourceFile], options: &'a ResolveOptions) -> Self {
        Self {
            options,
            units: files
                .iter()
                .map(|source| Unit {
                    source,
                    decls: Vec::new(),
                    roots: Vec::new(),
                    imports: HashMap::new(),
                })
                .collect(),
            identities: files
                .iter()
                .map(|f| (f.package.clone(), f.version.clone()))
                .collect(),
            errors: Vec::new(),
        }
    }

    /// Returns `false` if any identity is defined twice.
    fn check_duplicate_packages(&mut self) -> bool {
        let before = self.errors.len();
        let mut seen = HashMap::new();
        for (unit, identity) in self.identities.iter().enumerate() {
            if seen.insert(identity, unit).is_some() {
                self.errors.push(ResolveError::DuplicatePackage {
                    package: display_identity(&identity.0, identity.1.as_ref()),
                    span: Span::new(self.units[unit].source.file, 0..0),
                });
            }
        }
        self.errors.len() == before
    }

    fn assign_namespaces(&mut self) -> Vec<Namespace> {
        match namespace::assign(&self.identities, self.options.version_scheme) {
            Ok(namespaces) => namespaces,
            Err(errors) => {
                self.errors.extend(errors.into_iter().map(ResolveError::from));
                vec![Namespace::default(); self.identities.len()]
            }
        }
    }

    /// Allocate table entries for `decls` and everything nested in them.
    fn register(&mut self, unit: usize, decls: Vec<&'a ast::Decl>, parent: Option<usize>) -> Vec<usize> {
        let mut seen: HashMap<&'a str, Span> = HashMap::new();
        let mut indices = Vec::new();
        for decl in decls {
            if !self.unique(&mut seen, "declaration", &decl.name) {
                continue;
            }
            let index = self.units[unit].decls.len();
            self.units[unit].decls.push(Pending {
                name: decl.name.value.clone(),
                parent,
                children: Vec::new(),
                ast: decl,
            });
            let children = self.register(unit, nested_decls(decl), Some(index));
            self.units[unit].decls[index].children = children;
            indices.push(index);
        }
        indices
    }

    /// Record `name` in `seen`, reporting a duplicate if it is already there.
    fn unique(
        &mut self,
        seen: &mut HashMap<&'a str, Span>,
        what: &'static str,
        name: &'a Spanned<String>,
    ) -> bool {
        if let Some(&previous) = seen.get(name.value.as_str()) {
            self.errors.push(ResolveError::DuplicateName {
                what,
                name: name.value.clone(),
                span: name.span,
                previous,
            });
            return false;
        }
        seen.insert(&name.value, name.span);
        true
    }

    fn resolve_imports(&mut self, unit: usize) {
        let source = self.units[unit].source;
        for use_decl in &source.ast.uses {
            let range = match &use_decl.range {
                Some(range) => match VersionReq::parse(&range.value) {
                    Ok(range) => Some(range),
                    Err(error) => {
                        self.errors.push(ResolveError::InvalidVersionRange {
                            range: range.value.clone(),
                            message: error.to_string(),
                            span: range.span,
                        });
                        continue;
                    }
                },
                None => None,
            };
            let request = PackageRef {
                name: use_decl.package.value.clone(),
                range,
            };

            let target = match select(&request, &self.identities) {
                Selection::Found(target) => target,
                Selection::Missing => {
                    self.errors.push(ResolveError::UnresolvedPackage {
                        package: request.to_string(),
                        span: use_decl.span,
                    });
                    continue;
                }
                Selection::Ambiguous(candidates) => {
                    self.errors.push(ResolveError::AmbiguousVersion {
                        package: request.to_string(),
                        candidates: candidates
                            .iter()
                            .map(|&c| display_identity(&self.identities[c].0, self.identities[c].1.as_ref()))
                            .collect(),
                        span: use_decl.span,
                    });
                    continue;
                }
            };

            let alias = use_decl.local_name().to_string();
            if let Some(&(_, previous)) = self.units[unit].imports.get(&alias) {
                self.errors.push(ResolveError::DuplicateImport {
                    alias,
                    span: use_decl.span,
                    previous,
                });
                continue;
            }
            debug!(
                from = %source.package,
                import = %request,
                selected = %display_identity(&self.identities[target].0, self.identities[target].1.as_ref()),
                "resolved import"
            );
            self.units[unit].imports.insert(alias, (target, use_decl.span));
        }
    }

    fn build_package(&mut self, unit: usize, namespace: Namespace) -> Package {
        let package = PackageId(unit);
        let decls = (0..self.units[unit].decls.len())
            .map(|index| {
                let kind = self.convert(unit, index);
                let pending = &self.units[unit].decls[index];
                Decl {
                    id: DeclId { package, index },
                    name: pending.name.clone(),
                    doc: pending.ast.doc.clone(),
                    parent: pending.parent,
                    children: pending.children.clone(),
                    kind,
                    span: pending.ast.span,
                }
            })
            .collect();

        let source = self.units[unit].source;
        Package {
            id: package,
            name: source.package.clone(),
            version: source.version.clone(),
            namespace,
            doc: source.ast.doc.clone(),
            decls,
            roots: self.units[unit].roots.clone(),
        }
    }

    fn find_path(&self, unit: usize, start: &[usize], path: &[String]) -> Option<usize> {
        let decls = &self.units[unit].decls;
        let (first, rest) = path.split_first()?;
        let mut current = *start.iter().find(|&&i| decls[i].name == *first)?;
        for segment in rest {
            current = *decls[current]
                .children
                .iter()
                .find(|&&i| decls[i].name == *segment)?;
        }
        Some(current)
    }

    /// Look `name` up from `scope` outwards, or in an imported package.
    fn lookup(&self, unit: usize, scope: Option<usize>, name: &ast::Name) -> Option<DeclId> {
        if let Some(prefix) = &name.prefix {
            let &(target, _) = self.units[unit].imports.get(prefix)?;
            let index = self.find_path(target, &self.units[target].roots, &name.path)?;
            return Some(DeclId {
                package: PackageId(target),
                index,
            });
        }

        let mut scope = scope;
        loop {
            let start = match scope {
                Some(index) => &self.units[unit].decls[index].children,
                None => &self.units[unit].roots,
            };
            if let Some(index) = self.find_path(unit, start, &name.path) {
                return Some(DeclId {
                    package: PackageId(unit),
                    index,
                });
            }
            scope = self.units[unit].decls[scope?].parent;
        }
    }

    fn convert_type(&mut self, unit: usize, scope: usize, ty: &ast::Type) -> TypeRef {
        match ty {
            ast::Type::Primitive(primitive) => TypeRef::Primitive(*primitive),
            ast::Type::Array(inner) => {
                TypeRef::Array(Box::new(self.convert_type(unit, scope, inner)))
            }
            ast::Type::Map(key, value) => {
                let key_ref = self.convert_type(unit, scope, key);
                let valid_key = matches!(
                    &key_ref,
                    TypeRef::Primitive(p) if *p == Primitive::String || p.is_integer()
                );
                if !valid_key {
                    self.errors.push(ResolveError::InvalidMapKey {
                        found: describe(key),
                        span: self.units[unit].decls[scope].ast.name.span,
                    });
                }
                let value_ref = self.convert_type(unit, scope, value);
                TypeRef::Map(Box::new(key_ref), Box::new(value_ref))
            }
            ast::Type::Tuple(items) => TypeRef::Tuple(
                items
                    .iter()
                    .map(|item| self.convert_type(unit, scope, item))
                    .collect(),
            ),
            ast::Type::Name(name) => match self.lookup(unit, Some(scope), name) {
                Some(id) => TypeRef::Decl(id),
                None => {
                    self.errors.push(ResolveError::UnresolvedReference {
                        name: name.to_string(),
                        span: name.span,
                    });
                    // Placeholder; the run fails before anything reads it.
                    TypeRef::Primitive(Primitive::Any)
                }
            },
        }
    }

    fn convert_field(&mut self, unit: usize, scope: usize, field: &ast::Field) -> Field {
        Field {
            name: field.name.value.clone(),
            json_name: field
                .alias
                .as_ref()
                .map(|alias| alias.value.clone())
                .unwrap_or_else(|| field.name.value.clone()),
            ty: self.convert_type(unit, scope, &field.ty.value),
            optional: field.optional,
            doc: field.doc.clone(),
            span: field.span,
        }
    }

    fn convert_fields(&mut self, unit: usize, scope: usize, members: &[ast::Member]) -> Vec<Field> {
        field_members(members)
            .map(|field| self.convert_field(unit, scope, field))
            .collect()
    }

    /// Check names and JSON names are unique, reporting only fields at or after `skip`.
    fn check_fields(&mut self, fields: &[&Field], skip: usize) {
        let mut names: HashMap<&str, Span> = HashMap::new();
        let mut json_names: HashMap<&str, Span> = HashMap::new();
        for (index, field) in fields.iter().enumerate() {
            if let Some(&previous) = names.get(field.name.as_str()) {
                if index >= skip {
                    self.errors.push(ResolveError::DuplicateName {
                        what: "field",
                        name: field.name.clone(),
                        span: field.span,
                        previous,
                    });
                }
                continue;
            }
            names.insert(&field.name, field.span);

            if let Some(&previous) = json_names.get(field.json_name.as_str()) {
                if index >= skip {
                    self.errors.push(ResolveError::DuplicateJsonName {
                        name: field.json_name.clone(),
                        span: field.span,
                        previous,
                    });
                }
                continue;
            }
            json_names.insert(&field.json_name, field.span);
        }
    }

    fn convert(&mut self, unit: usize, index: usize) -> DeclKind {
        let decl = self.units[unit].decls[index].ast;

        if !matches!(decl.kind, ast::DeclKind::Interface(_)) {
            for attribute in &decl.attributes {
                self.errors.push(ResolveError::UnknownAttribute {
                    name: attribute.name.value.clone(),
                    span: attribute.name.span,
                });
            }
        }

        match &decl.kind {
            ast::DeclKind::Type(members) => {
                let fields = self.convert_fields(unit, index, members);
                self.check_fields(&fields.iter().collect::<Vec<_>>(), 0);
                DeclKind::Type(TypeBody { fields })
            }
            ast::DeclKind::Tuple(members) => {
                let fields = self.convert_fields(unit, index, members);
                self.check_fields(&fields.iter().collect::<Vec<_>>(), 0);
                for field in fields.iter().filter(|f| f.optional) {
                    self.errors.push(ResolveError::OptionalTupleField {
                        field: field.name.clone(),
                        span: field.span,
                    });
                }
                DeclKind::Tuple(TupleBody { fields })
            }
            ast::DeclKind::Interface(body) => self.convert_interface(unit, index, decl, body),
            ast::DeclKind::Enum(body) => self.convert_enum(body),
            ast::DeclKind::Service(body) => self.convert_service(unit, index, body),
        }
    }

    fn type_info(&mut self, attributes: &[ast::Attribute]) -> SubTypeStrategy {
        let mut strategy = SubTypeStrategy::Tagged {
            tag: self.options.default_tag.clone(),
        };

        for attribute in attributes {
            if attribute.name.value != "type_info" {
                self.errors.push(ResolveError::UnknownAttribute {
                    name: attribute.name.value.clone(),
                    span: attribute.name.span,
                });
                continue;
            }

            let mut kind = None;
            let mut tag = None;
            for arg in &attribute.args {
                let value = match &arg.value {
                    Some(Spanned {
                        value: ast::Value::String(value),
                        ..
                    }) => value.clone(),
                    Some(other) => {
                        self.errors.push(ResolveError::InvalidAttribute {
                            message: format!(
                                "`{}` expects a string, found {}",
                                arg.name.value,
                                other.value.kind()
                            ),
                            span: other.span,
                        });
                        continue;
                    }
                    None => {
                        self.errors.push(ResolveError::InvalidAttribute {
                            message: format!("`{}` requires a value", arg.name.value),
                            span: arg.name.span,
                        });
                        continue;
                    }
                };
                match arg.name.value.as_str() {
                    "strategy" => kind = Some(value),
                    "tag" => tag = Some(value),
                    other => self.errors.push(ResolveError::InvalidAttribute {
                        message: format!("unknown `type_info` argument `{}`", other),
                        span: arg.name.span,
                    }),
                }
            }

            strategy = match kind.as_deref() {
                None | Some("tagged") => SubTypeStrategy::Tagged {
                    tag: tag.unwrap_or_else(|| self.options.default_tag.clone()),
                },
                Some("untagged") => {
                    if tag.is_some() {
                        self.errors.push(ResolveError::InvalidAttribute {
                            message: "`tag` only applies to tagged interfaces".to_string(),
                            span: attribute.span,
                        });
                    }
                    SubTypeStrategy::Untagged
                }
                Some(other) => {
                    self.errors.push(ResolveError::InvalidAttribute {
                        message: format!(
                            "unknown strategy `{}`, expected `tagged` or `untagged`",
                            other
                        ),
                        span: attribute.span,
                    });
                    strategy
                }
            };
        }

        strategy
    }

    fn convert_interface(
        &mut self,
        unit: usize,
        index: usize,
        decl: &'a ast::Decl,
        body: &'a ast::InterfaceBody,
    ) -> DeclKind {
        let strategy = self.type_info(&decl.attributes);
        let fields = self.convert_fields(unit, index, &body.members);
        self.check_fields(&fields.iter().collect::<Vec<_>>(), 0);

        // Sub-types share a scope with nested declarations.
        let mut names: HashMap<&'a str, Span> = nested_decls(decl)
            .into_iter()
            .map(|nested| (nested.name.value.as_str(), nested.name.span))
            .collect();
        let mut literals: HashMap<String, Span> = HashMap::new();
        let mut sub_types = Vec::new();
        for sub_type in &body.sub_types {
            self.unique(&mut names, "sub-type", &sub_type.name);

            let literal = match &sub_type.alias {
                None => sub_type.name.value.clone(),
                Some(Spanned {
                    value: ast::Value::String(literal),
                    ..
                }) => literal.clone(),
                Some(other) => {
                    self.errors.push(ResolveError::InvalidDiscriminator {
                        found: other.value.kind(),
                        span: other.span,
                    });
                    sub_type.name.value.clone()
                }
            };
            if let Some(&previous) = literals.get(&literal) {
                self.errors.push(ResolveError::DuplicateDiscriminator {
                    literal: literal.clone(),
                    span: sub_type.name.span,
                    previous,
                });
            } else {
                literals.insert(literal.clone(), sub_type.name.span);
            }

            let own = self.convert_fields(unit, index, &sub_type.members);
            let combined: Vec<&Field> = fields.iter().chain(own.iter()).collect();
            self.check_fields(&combined, fields.len());

            sub_types.push(SubType {
                name: sub_type.name.value.clone(),
                literal,
                doc: sub_type.doc.clone(),
                fields: own,
                span: sub_type.span,
            });
        }

        if let SubTypeStrategy::Tagged { tag } = &strategy {
            let all = fields
                .iter()
                .chain(sub_types.iter().flat_map(|s| s.fields.iter()));
            for field in all.filter(|f| f.json_name == *tag) {
                self.errors.push(ResolveError::TagConflict {
                    tag: tag.clone(),
                    field: field.name.clone(),
                    span: field.span,
                });
            }
        }

        let body = InterfaceBody {
            fields,
            sub_types,
            strategy,
        };
        if body.strategy == SubTypeStrategy::Untagged {
            self.errors.extend(validate::untagged(&body));
        }
        DeclKind::Interface(body)
    }

    fn convert_enum(&mut self, body: &'a ast::EnumBody) -> DeclKind {
        let ty = match &body.ty {
            None => EnumType::String,
            Some(ty) => match &ty.value {
                ast::Type::Primitive(Primitive::String) => EnumType::String,
                ast::Type::Primitive(Primitive::U32) => EnumType::U32,
                ast::Type::Primitive(Primitive::U64) => EnumType::U64,
                ast::Type::Primitive(Primitive::I32) => EnumType::I32,
                ast::Type::Primitive(Primitive::I64) => EnumType::I64,
                other => {
                    self.errors.push(ResolveError::InvalidEnumType {
                        found: describe(other),
                        span: ty.span,
                    });
                    EnumType::String
                }
            },
        };

        let mut names = HashMap::new();
        let mut values: HashMap<EnumValue, Span> = HashMap::new();
        let mut members = Vec::new();
        for member in &body.members {
            self.unique(&mut names, "enum member", &member.name);

            let value = match self.enum_value(ty, member) {
                Ok(value) => value,
                Err(error) => {
                    self.errors.push(error);
                    continue;
                }
            };
            if let Some(&previous) = values.get(&value) {
                self.errors.push(ResolveError::DuplicateEnumValue {
                    value: value.to_string(),
                    span: member.span,
                    previous,
                });
                continue;
            }
            values.insert(value.clone(), member.span);

            members.push(EnumMember {
                name: member.name.value.clone(),
                value,
                doc: member.doc.clone(),
                span: member.span,
            });
        }

        DeclKind::Enum(EnumBody { ty, members })
    }

    fn enum_value(&self, ty: EnumType, member: &ast::EnumMember) -> Result<EnumValue, ResolveError> {
        let invalid = |message: String, span: Span| ResolveError::InvalidEnumValue {
            member: member.name.value.clone(),
            message,
            span,
        };

        let Some(value) = &member.value else {
            return match ty {
                EnumType::String => Ok(EnumValue::String(member.name.value.clone())),
                _ => Err(invalid(
                    format!("`{}` enums need an explicit value", ty.name()),
                    member.span,
                )),
            };
        };

        match (&value.value, ty.range()) {
            (ast::Value::String(text), None) => Ok(EnumValue::String(text.clone())),
            (ast::Value::Number(number), Some((min, max))) => match number.as_integer() {
                Some(n) if (min..=max).contains(&n) => Ok(EnumValue::Number(n)),
                Some(n) => Err(invalid(
                    format!("{} is out of range for `{}`", n, ty.name()),
                    value.span,
                )),
                None => Err(invalid(
                    format!("expected an integer, found {}", number),
                    value.span,
                )),
            },
            (other, _) => Err(invalid(
                format!("expected a `{}` value, found {}", ty.name(), other.kind()),
                value.span,
            )),
        }
    }

    fn convert_channel(&mut self, unit: usize, scope: usize, channel: &ast::Channel) -> Channel {
        Channel {
            ty: self.convert_type(unit, scope, &channel.ty.value),
            streaming: channel.streaming,
        }
    }

    fn convert_service(&mut self, unit: usize, index: usize, body: &'a ast::ServiceBody) -> DeclKind {
        let mut names = HashMap::new();
        let mut ids: HashMap<String, Span> = HashMap::new();
        let mut endpoints = Vec::new();

        for endpoint in &body.endpoints {
            self.unique(&mut names, "endpoint", &endpoint.name);

            let id = endpoint
                .alias
                .as_ref()
                .map(|alias| alias.value.clone())
                .unwrap_or_else(|| endpoint.name.value.clone());
            if let Some(&previous) = ids.get(&id) {
                self.errors.push(ResolveError::DuplicateName {
                    what: "endpoint id",
                    name: id.clone(),
                    span: endpoint.span,
                    previous,
                });
            } else {
                ids.insert(id.clone(), endpoint.span);
            }

            let mut argument_names = HashMap::new();
            let mut arguments = Vec::new();
            for argument in &endpoint.arguments {
                self.unique(&mut argument_names, "argument", &argument.name);
                arguments.push(Argument {
                    name: argument.name.value.clone(),
                    channel: self.convert_channel(unit, index, &argument.channel),
                });
            }

            let response = endpoint
                .response
                .as_ref()
                .map(|channel| self.convert_channel(unit, index, channel));

            endpoints.push(Endpoint {
                name: endpoint.name.value.clone(),
                id,
                doc: endpoint.doc.clone(),
                arguments,
                response,
                span: endpoint.span,
            });
        }

        DeclKind::Service(ServiceBody { endpoints })
    }
}
