//! Whole-declaration checks run after references are resolved.

use crate::error::{ResolveError, ResolveWarning};
use reproto_core::schema::{DeclId, DeclKind, InterfaceBody, Schema, SubType, TypeRef};
use std::collections::{BTreeSet, HashMap, HashSet};

fn required_keys<'a>(body: &'a InterfaceBody, sub_type: &'a SubType) -> BTreeSet<&'a str> {
    body.fields_of(sub_type)
        .filter(|f| f.is_required())
        .map(|f| f.json_name.as_str())
        .collect()
}

/// Check that untagged sub-types can be told apart by their required keys.
///
/// Decoding tries sub-types in declaration order, so a sub-type whose
/// required keys are a strict subset of a later one would shadow it.
pub(crate) fn untagged(body: &InterfaceBody) -> Vec<ResolveError> {
    let mut errors = Vec::new();
    let required: Vec<BTreeSet<&str>> = body
        .sub_types
        .iter()
        .map(|s| required_keys(body, s))
        .collect();

    for (i, earlier) in body.sub_types.iter().enumerate() {
        for (j, later) in body.sub_types.iter().enumerate().skip(i + 1) {
            if required[i] == required[j] {
                errors.push(ResolveError::UntaggedAmbiguous {
                    sub_type: later.name.clone(),
                    other: earlier.name.clone(),
                    span: later.span,
                });
            } else if required[i].is_subset(&required[j]) {
                errors.push(ResolveError::UntaggedOrdering {
                    sub_type: earlier.name.clone(),
                    later: later.name.clone(),
                    span: earlier.span,
                });
            }
        }
    }

    for (i, sub_type) in body.sub_types.iter().enumerate() {
        for field in body.fields_of(sub_type).filter(|f| f.optional) {
            let conflict = body
                .sub_types
                .iter()
                .enumerate()
                .find(|&(j, _)| j != i && required[j].contains(field.json_name.as_str()));
            if let Some((_, other)) = conflict {
                errors.push(ResolveError::UntaggedOptional {
                    sub_type: sub_type.name.clone(),
                    field: field.name.clone(),
                    other: other.name.clone(),
                    span: field.span,
                });
            }
        }
    }

    errors
}

/// Find types and tuples that can only be built from themselves.
///
/// Edges follow required fields whose type is directly another type or
/// tuple; arrays, maps and optional fields break a cycle.
pub(crate) fn required_cycles(schema: &Schema) -> Vec<ResolveWarning> {
    let nodes: Vec<DeclId> = schema
        .decls()
        .filter(|(_, d)| matches!(d.kind, DeclKind::Type(_) | DeclKind::Tuple(_)))
        .map(|(id, _)| id)
        .collect();

    let edges = |id: DeclId| -> Vec<DeclId> {
        schema
            .decl(id)
            .fields()
            .iter()
            .filter(|f| f.is_required())
            .filter_map(|f| match f.ty {
                TypeRef::Decl(target) => Some(target),
                _ => None,
            })
            .filter(|&target| {
                matches!(
                    schema.decl(target).kind,
                    DeclKind::Type(_) | DeclKind::Tuple(_)
                )
            })
            .collect()
    };

    let mut tarjan = Tarjan::default();
    for &node in &nodes {
        if !tarjan.index.contains_key(&node) {
            tarjan.visit(node, &edges);
        }
    }

    let mut warnings = Vec::new();
    for mut component in tarjan.components {
        let cyclic = component.len() > 1 || edges(component[0]).contains(&component[0]);
        if !cyclic {
            continue;
        }
        component.sort();
        let mut path: Vec<String> = component
            .iter()
            .map(|&id| schema.decl_path(id).join("::"))
            .collect();
        path.push(path[0].clone());
        warnings.push(ResolveWarning::RequiredCycle {
            path,
            span: schema.decl(component[0]).span,
        });
    }
    warnings.sort_by_key(|w| match w {
        ResolveWarning::RequiredCycle { span, .. } => (span.file, span.start),
    });
    warnings
}

#[derive(Default)]
struct Tarjan {
    next: usize,
    index: HashMap<DeclId, usize>,
    low: HashMap<DeclId, usize>,
    stack: Vec<DeclId>,
    on_stack: HashSet<DeclId>,
    components: Vec<Vec<DeclId>>,
}

/// A node whose outgoing edges are still being walked.
struct Frame {
    node: DeclId,
    targets: std::vec::IntoIter<DeclId>,
}

impl Tarjan {
    /// Iterative so a long chain of declarations cannot exhaust the call stack.
    fn visit(&mut self, root: DeclId, edges: &dyn Fn(DeclId) -> Vec<DeclId>) {
        let mut frames = vec![self.enter(root, edges)];
        while let Some(frame) = frames.last_mut() {
            let node = frame.node;
            if let Some(target) = frame.targets.next() {
                if !self.index.contains_key(&target) {
                    frames.push(self.enter(target, edges));
                } else if self.on_stack.contains(&target) {
                    let low = self.low[&node].min(self.index[&target]);
                    self.low.insert(node, low);
                }
                continue;
            }

            frames.pop();
            if let Some(parent) = frames.last() {
                let low = self.low[&parent.node].min(self.low[&node]);
                self.low.insert(parent.node, low);
            }
            if self.low[&node] == self.index[&node] {
                let mut component = Vec::new();
                while let Some(member) = self.stack.pop() {
                    self.on_stack.remove(&member);
                    component.push(member);
                    if member == node {
                        break;
                    }
                }
                self.components.push(component);
            }
        }
    }

    fn enter(&mut self, node: DeclId, edges: &dyn Fn(DeclId) -> Vec<DeclId>) -> Frame {
        self.index.insert(node, self.next);
        self.low.insert(node, self.next);
        self.next += 1;
        self.stack.push(node);
        self.on_stack.insert(node);
        Frame {
            node,
            targets: edges(node).into_iter(),
        }
    }
}
