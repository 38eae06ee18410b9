//! The compile pipeline: load → parse → resolve → emit → write.
//!
//! Every stage reports into one [`Diagnostics`] list. Parse errors stop the
//! pipeline before resolution; emitter errors only drop the affected
//! declaration for the affected target.

use crate::config::ReprotoConfig;
use crate::discover::discover;
use crate::error::LoadError;
use rayon::prelude::*;
use reproto_codegen::{Backend, EmitOptions, OutputFile};
use reproto_core::{
    DeclId, Diagnostics, DiscriminatorPlacement, FileId, PackageId, PackageName, Schema, Sources,
    Version,
};
use reproto_parser::parse;
use reproto_resolve::{ResolveOptions, SourceFile, resolve};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default source directory.
pub const DEFAULT_PATH: &str = "proto";
/// Default output root.
pub const DEFAULT_OUTPUT: &str = "target/reproto";

/// A registered source file and the package it defines.
#[derive(Debug, Clone)]
pub struct Input {
    pub file: FileId,
    pub package: PackageName,
    pub version: Option<Version>,
}

/// Result of parsing and resolving a set of sources.
pub struct Compilation {
    pub sources: Sources,
    pub diagnostics: Diagnostics,
    /// Present when no errors stopped resolution.
    pub schema: Option<Schema>,
}

impl Compilation {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }
}

/// Everything `build` needs, after config and flags are merged.
#[derive(Debug, Clone)]
pub struct BuildSettings {
    pub paths: Vec<PathBuf>,
    pub output: PathBuf,
    /// Backend names; empty means every registered backend.
    pub targets: Vec<String>,
    /// Package selectors, `name` or `name@version`; empty means all.
    pub packages: Vec<String>,
    pub resolve: ResolveOptions,
    pub discriminator_placement: DiscriminatorPlacement,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            paths: vec![PathBuf::from(DEFAULT_PATH)],
            output: PathBuf::from(DEFAULT_OUTPUT),
            targets: Vec::new(),
            packages: Vec::new(),
            resolve: ResolveOptions::default(),
            discriminator_placement: DiscriminatorPlacement::default(),
        }
    }
}

impl BuildSettings {
    pub fn from_config(config: &ReprotoConfig) -> Self {
        let defaults = Self::default();
        let build = &config.build;
        let codegen = &config.codegen;
        Self {
            paths: build.paths.clone().unwrap_or(defaults.paths),
            output: build.output.clone().unwrap_or(defaults.output),
            targets: build.targets.clone().unwrap_or_default(),
            packages: build.packages.clone().unwrap_or_default(),
            resolve: ResolveOptions {
                version_scheme: codegen.version_scheme.unwrap_or_default(),
                default_tag: codegen
                    .discriminator
                    .clone()
                    .unwrap_or(defaults.resolve.default_tag),
            },
            discriminator_placement: codegen.discriminator_placement.unwrap_or_default(),
        }
    }
}

/// Outcome of a build.
pub struct BuildReport {
    pub sources: Sources,
    pub diagnostics: Diagnostics,
    /// Written files, in output order.
    pub written: Vec<PathBuf>,
}

/// Discover and read every schema file below `paths`.
pub fn load(paths: &[PathBuf]) -> Result<(Sources, Vec<Input>), LoadError> {
    let mut sources = Sources::new();
    let mut inputs = Vec::new();
    for found in discover(paths)? {
        let text = std::fs::read_to_string(&found.path).map_err(|source| LoadError::Read {
            path: found.path.clone(),
            source,
        })?;
        let file = sources.add(found.path.display().to_string(), text);
        inputs.push(Input {
            file,
            package: found.package,
            version: found.version,
        });
    }
    info!(files = inputs.len(), "loaded sources");
    Ok((sources, inputs))
}

/// Parse and resolve registered sources.
pub fn compile(sources: Sources, inputs: &[Input], options: &ResolveOptions) -> Compilation {
    let mut diagnostics = Diagnostics::new();

    let parsed: Vec<_> = inputs
        .par_iter()
        .map(|input| parse(input.file, sources.source(input.file).unwrap_or_default()))
        .collect();

    let mut files = Vec::with_capacity(inputs.len());
    for (input, (ast, errors)) in inputs.iter().zip(parsed) {
        diagnostics.extend(errors.iter().map(|e| e.to_diagnostic()));
        files.push(SourceFile {
            file: input.file,
            package: input.package.clone(),
            version: input.version.clone(),
            ast,
        });
    }
    if diagnostics.has_errors() {
        debug!(errors = diagnostics.error_count(), "parse failed");
        return Compilation {
            sources,
            diagnostics,
            schema: None,
        };
    }

    let schema = match resolve(&files, options) {
        Ok(resolved) => {
            diagnostics.extend(resolved.warnings.iter().map(|w| w.to_diagnostic()));
            info!(packages = resolved.schema.packages.len(), "resolved");
            Some(resolved.schema)
        }
        Err(errors) => {
            debug!(errors = errors.len(), "resolution failed");
            diagnostics.extend(errors.iter().map(|e| e.to_diagnostic()));
            None
        }
    };

    Compilation {
        sources,
        diagnostics,
        schema,
    }
}

/// [`load`] then [`compile`].
pub fn check(paths: &[PathBuf], options: &ResolveOptions) -> Result<Compilation, LoadError> {
    let (sources, inputs) = load(paths)?;
    Ok(compile(sources, &inputs, options))
}

/// Compile, emit every selected target and write the files under
/// `<output>/<target>/`.
///
/// Files of targets that could emit are written even when another target
/// reported errors.
pub fn build(settings: &BuildSettings) -> Result<BuildReport, LoadError> {
    let backends = select_backends(&settings.targets)?;
    let Compilation {
        sources,
        mut diagnostics,
        schema,
    } = check(&settings.paths, &settings.resolve)?;

    let Some(schema) = schema else {
        return Ok(BuildReport {
            sources,
            diagnostics,
            written: Vec::new(),
        });
    };

    let mut packages = Vec::new();
    for selector in &settings.packages {
        packages.extend(select_packages(&schema, selector)?);
    }
    let options = EmitOptions {
        discriminator_placement: settings.discriminator_placement,
        packages,
    };

    let emitted = reproto_codegen::emit(&schema, &backends, &options);
    diagnostics.extend(emitted.errors.iter().map(|e| e.to_diagnostic()));
    let written = write_files(&settings.output, &emitted.files)?;

    Ok(BuildReport {
        sources,
        diagnostics,
        written,
    })
}

/// Look up backends by name; no names selects all of them.
pub fn select_backends(names: &[String]) -> Result<Vec<&'static dyn Backend>, LoadError> {
    if names.is_empty() {
        return Ok(reproto_codegen::backends());
    }
    names
        .iter()
        .map(|name| {
            reproto_codegen::get_backend(name).ok_or_else(|| LoadError::UnknownTarget {
                name: name.clone(),
                available: reproto_codegen::backend_names(),
            })
        })
        .collect()
}

/// Packages matching `selector`: a name selects every version, `name@version`
/// exactly one.
pub fn select_packages(schema: &Schema, selector: &str) -> Result<Vec<PackageId>, LoadError> {
    let unknown = || LoadError::UnknownPackage(selector.to_string());
    let (name, version) = match selector.split_once('@') {
        Some((name, version)) => (name, Some(Version::parse(version).map_err(|_| unknown())?)),
        None => (selector, None),
    };
    let name = PackageName::parse(name).ok_or_else(unknown)?;

    let selected: Vec<PackageId> = schema
        .packages
        .iter()
        .filter(|p| p.name == name && (version.is_none() || p.version == version))
        .map(|p| p.id)
        .collect();
    if selected.is_empty() {
        return Err(unknown());
    }
    Ok(selected)
}

/// Find a declaration by `package::Outer::Inner`, where the package is a
/// selector accepted by [`select_packages`] that matches one version.
pub fn lookup_decl(schema: &Schema, name: &str) -> Result<DeclId, LoadError> {
    let (selector, path) = name
        .split_once("::")
        .filter(|(_, path)| !path.is_empty())
        .ok_or_else(|| LoadError::MalformedName(name.to_string()))?;

    let package = match select_packages(schema, selector)?.as_slice() {
        [package] => *package,
        candidates => {
            return Err(LoadError::AmbiguousPackage {
                name: selector.to_string(),
                candidates: candidates
                    .iter()
                    .map(|id| schema.package(*id).identity())
                    .collect(),
            });
        }
    };

    let segments: Vec<&str> = path.split("::").collect();
    schema
        .lookup(package, &segments)
        .ok_or_else(|| LoadError::UnknownDecl {
            package: schema.package(package).identity(),
            path: path.to_string(),
        })
}

/// Write generated files below `output`, one directory per backend.
pub fn write_files(output: &Path, files: &[OutputFile]) -> Result<Vec<PathBuf>, LoadError> {
    let mut written = Vec::with_capacity(files.len());
    for file in files {
        let path = output.join(file.backend).join(&file.path);
        let write_error = |source| LoadError::Write {
            path: path.clone(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_error)?;
        }
        std::fs::write(&path, &file.contents).map_err(write_error)?;
        debug!(path = %path.display(), "wrote");
        written.push(path);
    }
    info!(files = written.len(), output = %output.display(), "wrote output");
    Ok(written)
}

