//! Parallel emission over (backend, declaration) pairs.

use crate::error::EmitError;
use crate::traits::{Backend, Context, EmitOptions, Fragment, OutputFile};
use rayon::prelude::*;
use reproto_core::{DeclId, Schema};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, info};

/// Generated files plus the declarations some backend could not emit.
#[derive(Debug, Default)]
pub struct Emitted {
    /// Sorted by backend name, then path.
    pub files: Vec<OutputFile>,
    pub errors: Vec<EmitError>,
}

/// Run every backend over every selected top-level declaration.
///
/// Declarations are rendered in parallel; each file's fragments are then
/// assembled in source order. An error in one backend never affects the
/// output of another.
pub fn emit(schema: &Schema, backends: &[&dyn Backend], options: &EmitOptions) -> Emitted {
    let cx = Context { schema, options };

    let units: Vec<(&dyn Backend, DeclId)> = backends
        .iter()
        .flat_map(|&backend| {
            schema
                .packages
                .iter()
                .filter(|p| options.packages.is_empty() || options.packages.contains(&p.id))
                .flat_map(move |p| p.roots().map(move |(id, _)| (backend, id)))
        })
        .collect();

    let results: Vec<(&dyn Backend, Result<Fragment, EmitError>)> = units
        .par_iter()
        .map(|&(backend, id)| (backend, backend.emit_decl(&cx, id)))
        .collect();

    let mut errors = Vec::new();
    let mut groups: BTreeMap<(&'static str, PathBuf), (&dyn Backend, Vec<Fragment>)> =
        BTreeMap::new();
    for (backend, result) in results {
        match result {
            Ok(fragment) => {
                let path = backend.path(&cx, fragment.decl);
                groups
                    .entry((backend.name(), path))
                    .or_insert_with(|| (backend, Vec::new()))
                    .1
                    .push(fragment);
            }
            Err(error) => {
                debug!(backend = backend.name(), %error, "skipped declaration");
                errors.push(error);
            }
        }
    }

    let files: Vec<OutputFile> = groups
        .into_par_iter()
        .map(|((name, path), (backend, fragments))| {
            let contents = backend.assemble(&cx, &path, &fragments);
            debug!(backend = name, path = %path.display(), "assembled file");
            OutputFile {
                backend: name,
                path,
                contents,
            }
        })
        .collect();

    info!(
        files = files.len(),
        errors = errors.len(),
        backends = backends.len(),
        "emission finished"
    );
    Emitted { files, errors }
}
