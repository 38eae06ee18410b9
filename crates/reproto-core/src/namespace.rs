//! Mapping of package identities to target-safe namespace segments.
//!
//! A package `foo.bar` at `1.2.3` keeps its name parts and gains one version
//! segment, chosen by the configured [`VersionScheme`]:
//!
//! | scheme        | `1.2.3`    |
//! | ------------- | ---------- |
//! | `underscored` | `_1_2_3`   |
//! | `major`       | `V1`       |
//! | `minimal`     | `V1`, escalated to `V1_2` or `V1_2_3` on collision |
//!
//! Targets apply their own casing to the name parts but never to the version
//! segment.

use crate::package::{PackageName, display_identity};
use codespan_reporting::diagnostic::Diagnostic;
use semver::Version;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;

/// Encoding used for version segments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VersionScheme {
    /// Every version component, `_1_0_0`.
    #[default]
    Underscored,
    /// Major version only, `V1`.
    Major,
    /// Major version, widened per package only as far as needed to be unique.
    Minimal,
}

impl VersionScheme {
    pub fn name(&self) -> &'static str {
        match self {
            VersionScheme::Underscored => "underscored",
            VersionScheme::Major => "major",
            VersionScheme::Minimal => "minimal",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "underscored" => Some(VersionScheme::Underscored),
            "major" => Some(VersionScheme::Major),
            "minimal" => Some(VersionScheme::Minimal),
            _ => None,
        }
    }
}

/// Namespace of one package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Namespace {
    /// Package name parts, uncased.
    pub parts: Vec<String>,
    /// Version segment, absent for unversioned packages.
    pub version: Option<String>,
}

impl Namespace {
    /// All segments, version last.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.parts
            .iter()
            .map(String::as_str)
            .chain(self.version.as_deref())
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let segments: Vec<&str> = self.segments().collect();
        f.write_str(&segments.join("."))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NamespaceError {
    #[error("packages `{first}` and `{second}` both map to namespace `{namespace}`")]
    Collision {
        namespace: String,
        first: String,
        second: String,
    },
}

impl NamespaceError {
    pub fn to_diagnostic<F>(&self) -> Diagnostic<F> {
        match self {
            NamespaceError::Collision { .. } => Diagnostic::error()
                .with_message(self.to_string())
                .with_notes(vec![
                    "use a version scheme that keeps more version components".to_string(),
                ]),
        }
    }
}

/// Number of version components kept in a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Level {
    Major = 1,
    Minor = 2,
    Patch = 3,
}

fn symbolic(version: &Version, level: Level) -> String {
    let mut segment = format!("V{}", version.major);
    if level >= Level::Minor {
        segment.push_str(&format!("_{}", version.minor));
    }
    if level >= Level::Patch {
        segment.push_str(&format!("_{}", version.patch));
        push_pre_release(&mut segment, version);
    }
    segment
}

fn underscored(version: &Version) -> String {
    let mut segment = format!("_{}_{}_{}", version.major, version.minor, version.patch);
    push_pre_release(&mut segment, version);
    segment
}

fn push_pre_release(segment: &mut String, version: &Version) {
    if version.pre.is_empty() {
        return;
    }
    segment.push('_');
    segment.extend(
        version
            .pre
            .as_str()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' }),
    );
}

/// Version segment for a single version, ignoring other packages.
///
/// For [`VersionScheme::Minimal`] this is the unescalated major segment.
pub fn version_segment(version: &Version, scheme: VersionScheme) -> String {
    match scheme {
        VersionScheme::Underscored => underscored(version),
        VersionScheme::Major | VersionScheme::Minimal => symbolic(version, Level::Major),
    }
}

/// Assign a namespace to every package identity, in input order.
///
/// Fails if two distinct identities end up with the same namespace.
pub fn assign(
    packages: &[(PackageName, Option<Version>)],
    scheme: VersionScheme,
) -> Result<Vec<Namespace>, Vec<NamespaceError>> {
    let namespaces: Vec<Namespace> = packages
        .iter()
        .map(|(name, version)| Namespace {
            parts: name.parts().to_vec(),
            version: version.as_ref().map(|v| match scheme {
                VersionScheme::Minimal => symbolic(v, minimal_level(name, v, packages)),
                _ => version_segment(v, scheme),
            }),
        })
        .collect();

    let mut errors = Vec::new();
    let mut owners: HashMap<&Namespace, usize> = HashMap::new();
    for (index, namespace) in namespaces.iter().enumerate() {
        if let Some(&first) = owners.get(namespace) {
            let (first_name, first_version) = &packages[first];
            let (second_name, second_version) = &packages[index];
            errors.push(NamespaceError::Collision {
                namespace: namespace.to_string(),
                first: display_identity(first_name, first_version.as_ref()),
                second: display_identity(second_name, second_version.as_ref()),
            });
        } else {
            owners.insert(namespace, index);
        }
    }

    if errors.is_empty() {
        Ok(namespaces)
    } else {
        Err(errors)
    }
}

/// Smallest level at which `version` differs from every other version of `name`.
fn minimal_level(
    name: &PackageName,
    version: &Version,
    packages: &[(PackageName, Option<Version>)],
) -> Level {
    let siblings: Vec<&Version> = packages
        .iter()
        .filter(|(n, _)| n == name)
        .filter_map(|(_, v)| v.as_ref())
        .filter(|v| *v != version)
        .collect();

    for level in [Level::Major, Level::Minor] {
        let own = symbolic(version, level);
        if siblings.iter().all(|other| symbolic(other, level) != own) {
            return level;
        }
    }
    Level::Patch
}
