//! Selecting an installed package for a `use` declaration.

use reproto_core::{PackageName, PackageRef, Version};

/// Outcome of matching a request against installed packages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Found(usize),
    Missing,
    /// No range was given and several versions are installed.
    Ambiguous(Vec<usize>),
}

/// Pick the installed package satisfying `request`.
///
/// With a version range the highest matching version wins. Without one, the
/// request must match exactly one installed package.
pub fn select(request: &PackageRef, installed: &[(PackageName, Option<Version>)]) -> Selection {
    let candidates: Vec<usize> = installed
        .iter()
        .enumerate()
        .filter(|(_, (name, version))| request.matches(name, version.as_ref()))
        .map(|(index, _)| index)
        .collect();

    match (candidates.as_slice(), &request.range) {
        ([], _) => Selection::Missing,
        ([only], _) => Selection::Found(*only),
        (_, None) => Selection::Ambiguous(candidates),
        (_, Some(_)) => candidates
            .iter()
            .copied()
            .max_by(|&a, &b| installed[a].1.cmp(&installed[b].1))
            .map(Selection::Found)
            .unwrap_or(Selection::Missing),
    }
}
