//! Package names and versioned package identities.

use semver::{Version, VersionReq};
use std::fmt;

/// A dotted package name such as `foo.bar`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageName {
    parts: Vec<String>,
}

impl PackageName {
    pub fn new(parts: Vec<String>) -> Self {
        Self { parts }
    }

    /// Parse `foo.bar.baz`. Empty segments are rejected.
    pub fn parse(name: &str) -> Option<Self> {
        let parts: Vec<String> = name.split('.').map(str::to_string).collect();
        if parts.iter().any(|p| !is_package_segment(p)) {
            return None;
        }
        Some(Self { parts })
    }

    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    pub fn last(&self) -> &str {
        self.parts.last().map(String::as_str).unwrap_or_default()
    }
}

fn is_package_segment(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.parts.join("."))
    }
}

/// A request for a package, optionally constrained to a version range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRef {
    pub name: PackageName,
    pub range: Option<VersionReq>,
}

impl PackageRef {
    pub fn matches(&self, name: &PackageName, version: Option<&Version>) -> bool {
        if &self.name != name {
            return false;
        }
        match (&self.range, version) {
            (None, _) => true,
            (Some(range), Some(version)) => range.matches(version),
            (Some(_), None) => false,
        }
    }
}

impl fmt::Display for PackageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.range {
            Some(range) => write!(f, "{} \"{}\"", self.name, range),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Render a package identity as `name@version`, or just `name` when unversioned.
pub fn display_identity(name: &PackageName, version: Option<&Version>) -> String {
    match version {
        Some(version) => format!("{}@{}", name, version),
        None => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_package_name() {
        let name = PackageName::parse("foo.bar_baz").unwrap();
        assert_eq!(name.parts(), ["foo", "bar_baz"]);
        assert_eq!(name.to_string(), "foo.bar_baz");
        assert_eq!(name.last(), "bar_baz");

        assert!(PackageName::parse("foo..bar").is_none());
        assert!(PackageName::parse("Foo").is_none());
        assert!(PackageName::parse("").is_none());
    }

    #[test]
    fn test_package_ref_matches_range() {
        let name = PackageName::parse("bar").unwrap();
        let request = PackageRef {
            name: name.clone(),
            range: Some(VersionReq::parse("^1.0.0").unwrap()),
        };
        assert!(request.matches(&name, Some(&Version::new(1, 4, 2))));
        assert!(!request.matches(&name, Some(&Version::new(2, 0, 0))));
        assert!(!request.matches(&name, None));
    }
}
