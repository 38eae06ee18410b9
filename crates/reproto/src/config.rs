//! Configuration for reproto.
//!
//! Loads config from:
//! 1. Global: ~/.config/reproto/config.toml
//! 2. Per-project: reproto.toml, or the file given with `--config` (overrides global)
//!
//! Example reproto.toml:
//! ```toml
//! [build]
//! paths = ["proto"]
//! output = "target/reproto"
//! targets = ["csharp", "js"]
//!
//! [codegen]
//! version-scheme = "major"
//! discriminator = "kind"
//! discriminator-placement = "first"
//! ```
//!
//! Relative paths in a project file are taken relative to the file itself.

use reproto_core::{DiscriminatorPlacement, VersionScheme};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// File name of the per-project config.
pub const PROJECT_FILE: &str = "reproto.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config `{}`: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config `{}`: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Where sources are read from and what gets built.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Directories searched for `*.reproto` files.
    pub paths: Option<Vec<PathBuf>>,
    /// Output root, one sub-directory per target.
    pub output: Option<PathBuf>,
    /// Backends to run; all registered backends when unset.
    pub targets: Option<Vec<String>>,
    /// Packages to emit, `name` or `name@version`; all when unset.
    pub packages: Option<Vec<String>>,
}

/// Settings that change the shape of generated code.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct CodegenConfig {
    pub version_scheme: Option<VersionScheme>,
    /// Discriminator key of tagged interfaces without a `tag` attribute.
    pub discriminator: Option<String>,
    pub discriminator_placement: Option<DiscriminatorPlacement>,
}

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ReprotoConfig {
    pub build: BuildConfig,
    pub codegen: CodegenConfig,
}

impl ReprotoConfig {
    /// Load configuration for a project.
    ///
    /// The global config is read first, then `explicit` or `<root>/reproto.toml`
    /// is merged over it. Missing files are skipped, except an `explicit` one.
    pub fn load(root: &Path, explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(global_path) = Self::global_config_path()
            && let Some(global) = Self::load_file(&global_path)?
        {
            config = config.merge(global);
        }

        let project_path = explicit
            .map(Path::to_path_buf)
            .unwrap_or_else(|| root.join(PROJECT_FILE));
        let project = match explicit {
            Some(path) => Some(Self::read_file(path)?),
            None => Self::load_file(&project_path)?,
        };
        if let Some(project) = project {
            let base = project_path.parent().unwrap_or(root);
            config = config.merge(project.rebase(base));
        }

        Ok(config)
    }

    /// Get the global config path.
    pub fn global_config_path() -> Option<PathBuf> {
        let config_home = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(dirs::config_dir)?;
        Some(config_home.join("reproto").join("config.toml"))
    }

    /// Load config from a file path, `None` if it does not exist.
    pub fn load_file(path: &Path) -> Result<Option<Self>, ConfigError> {
        match Self::read_file(path) {
            Ok(config) => Ok(Some(config)),
            Err(ConfigError::Read { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                Ok(None)
            }
            Err(error) => Err(error),
        }
    }

    fn read_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Merge another config into this one; values set in `other` win.
    pub fn merge(self, other: Self) -> Self {
        Self {
            build: BuildConfig {
                paths: other.build.paths.or(self.build.paths),
                output: other.build.output.or(self.build.output),
                targets: other.build.targets.or(self.build.targets),
                packages: other.build.packages.or(self.build.packages),
            },
            codegen: CodegenConfig {
                version_scheme: other.codegen.version_scheme.or(self.codegen.version_scheme),
                discriminator: other.codegen.discriminator.or(self.codegen.discriminator),
                discriminator_placement: other
                    .codegen
                    .discriminator_placement
                    .or(self.codegen.discriminator_placement),
            },
        }
    }

    /// Make relative paths relative to `base`.
    fn rebase(mut self, base: &Path) -> Self {
        let join = |path: PathBuf| {
            if path.is_relative() {
                base.join(path)
            } else {
                path
            }
        };
        self.build.paths = self
            .build
            .paths
            .map(|paths| paths.into_iter().map(join).collect());
        self.build.output = self.build.output.map(join);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = ReprotoConfig::default();
        assert_eq!(config.build.paths, None);
        assert_eq!(config.codegen.version_scheme, None);
    }

    #[test]
    fn test_load_project_config() {
        let dir = TempDir::new().unwrap();
        let mut file = std::fs::File::create(dir.path().join(PROJECT_FILE)).unwrap();
        writeln!(
            file,
            r#"
[build]
paths = ["schemas"]
targets = ["js"]

[codegen]
version-scheme = "major"
discriminator-placement = "first"
"#
        )
        .unwrap();

        let config = ReprotoConfig::load(dir.path(), None).unwrap();
        assert_eq!(config.build.paths, Some(vec![dir.path().join("schemas")]));
        assert_eq!(config.build.targets, Some(vec!["js".to_string()]));
        assert_eq!(config.codegen.version_scheme, Some(VersionScheme::Major));
        assert_eq!(
            config.codegen.discriminator_placement,
            Some(DiscriminatorPlacement::First)
        );
    }

    #[test]
    fn test_merge_keeps_unset_values() {
        let global = ReprotoConfig {
            codegen: CodegenConfig {
                discriminator: Some("kind".to_string()),
                version_scheme: Some(VersionScheme::Minimal),
                ..Default::default()
            },
            ..Default::default()
        };
        let project = ReprotoConfig {
            codegen: CodegenConfig {
                version_scheme: Some(VersionScheme::Major),
                ..Default::default()
            },
            ..Default::default()
        };

        let merged = global.merge(project);
        assert_eq!(merged.codegen.discriminator.as_deref(), Some("kind"));
        assert_eq!(merged.codegen.version_scheme, Some(VersionScheme::Major));
    }

    #[test]
    fn test_explicit_config_must_exist() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("custom.toml");
        assert!(matches!(
            ReprotoConfig::load(dir.path(), Some(&missing)),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn test_invalid_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(PROJECT_FILE);
        std::fs::write(&path, "[codegen]\nversion-scheme = \"dotted\"\n").unwrap();
        assert!(matches!(
            ReprotoConfig::load_file(&path),
            Err(ConfigError::Parse { .. })
        ));

        std::fs::write(&path, "[build]\npath = [\"proto\"]\n").unwrap();
        assert!(matches!(
            ReprotoConfig::load_file(&path),
            Err(ConfigError::Parse { .. })
        ));
    }
}
