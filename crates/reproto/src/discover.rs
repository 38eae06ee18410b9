//! Source discovery.
//!
//! A file's package comes from its path below the source root: directories
//! and the file stem joined with `.`. A stem `name-<semver>` also carries the
//! package version, so `foo/bar-1.0.0.reproto` is `foo.bar@1.0.0`.

use crate::error::LoadError;
use reproto_core::package::display_identity;
use reproto_core::{PackageName, Version};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Extension of schema files.
pub const EXTENSION: &str = "reproto";

/// A schema file and the package identity its path gives it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovered {
    pub path: PathBuf,
    pub package: PackageName,
    pub version: Option<Version>,
}

/// Find every schema file below `roots`, sorted by path within each root.
pub fn discover(roots: &[PathBuf]) -> Result<Vec<Discovered>, LoadError> {
    let mut found = Vec::new();
    let mut seen: HashMap<String, PathBuf> = HashMap::new();

    for root in roots {
        if !root.is_dir() {
            return Err(LoadError::MissingRoot { path: root.clone() });
        }
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry?;
            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().is_none_or(|extension| extension != EXTENSION)
            {
                continue;
            }

            let (package, version) = identity(root, path)?;
            let key = display_identity(&package, version.as_ref());
            if let Some(first) = seen.get(&key) {
                return Err(LoadError::DuplicatePackage {
                    identity: key,
                    first: first.clone(),
                    second: path.to_path_buf(),
                });
            }
            debug!(path = %path.display(), package = %key, "discovered");
            seen.insert(key, path.to_path_buf());
            found.push(Discovered {
                path: path.to_path_buf(),
                package,
                version,
            });
        }
    }

    Ok(found)
}

/// Package name and version of `path`, a file below `root`.
pub fn identity(root: &Path, path: &Path) -> Result<(PackageName, Option<Version>), LoadError> {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let invalid = |name: String| LoadError::InvalidPackageName {
        path: path.to_path_buf(),
        name,
    };

    let stem = relative
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| invalid(relative.display().to_string()))?;
    let (name, version) = match stem.split_once('-') {
        Some((name, version)) => {
            let parsed = Version::parse(version).map_err(|error| LoadError::InvalidVersion {
                path: path.to_path_buf(),
                version: version.to_string(),
                message: error.to_string(),
            })?;
            (name, Some(parsed))
        }
        None => (stem, None),
    };

    let mut parts = Vec::new();
    if let Some(parent) = relative.parent() {
        for component in parent.components() {
            let part = component
                .as_os_str()
                .to_str()
                .ok_or_else(|| invalid(relative.display().to_string()))?;
            parts.push(part.to_string());
        }
    }
    parts.push(name.to_string());

    let joined = parts.join(".");
    let package = PackageName::parse(&joined).ok_or_else(|| invalid(joined.clone()))?;
    Ok((package, version))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "").unwrap();
    }

    #[test]
    fn test_identity_from_path() {
        let root = Path::new("proto");
        let (package, version) = identity(root, Path::new("proto/foo/bar-1.0.0.reproto")).unwrap();
        assert_eq!(package.to_string(), "foo.bar");
        assert_eq!(version, Some(Version::new(1, 0, 0)));

        let (package, version) = identity(root, Path::new("proto/baz.reproto")).unwrap();
        assert_eq!(package.to_string(), "baz");
        assert_eq!(version, None);
    }

    #[test]
    fn test_identity_rejects_bad_names() {
        let root = Path::new("proto");
        assert!(matches!(
            identity(root, Path::new("proto/Foo.reproto")),
            Err(LoadError::InvalidPackageName { .. })
        ));
        assert!(matches!(
            identity(root, Path::new("proto/foo-one.reproto")),
            Err(LoadError::InvalidVersion { version, .. }) if version == "one"
        ));
    }

    #[test]
    fn test_discover_walks_sorted() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "b.reproto");
        touch(dir.path(), "a/c-2.0.0.reproto");
        touch(dir.path(), "a/notes.txt");

        let found = discover(&[dir.path().to_path_buf()]).unwrap();
        let names: Vec<String> = found
            .iter()
            .map(|f| display_identity(&f.package, f.version.as_ref()))
            .collect();
        assert_eq!(names, ["a.c@2.0.0", "b"]);
    }

    #[test]
    fn test_discover_duplicate_identity() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        touch(first.path(), "foo.reproto");
        touch(second.path(), "foo.reproto");

        let error = discover(&[first.path().to_path_buf(), second.path().to_path_buf()])
            .unwrap_err();
        assert!(matches!(error, LoadError::DuplicatePackage { identity, .. } if identity == "foo"));
    }

    #[test]
    fn test_discover_missing_root() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            discover(&[missing]),
            Err(LoadError::MissingRoot { .. })
        ));
    }
}
